//! Database repository for fee management: fee types, fee structures,
//! student bills and payments.

use crate::db::errors::{DbError, Result};
use crate::db::models::fees::{
    BillDBResponse, BillStatus, FeePaymentCreateDBRequest, FeePaymentDBResponse, FeeStructureCreateDBRequest, FeeStructureDBResponse,
    FeeTypeDBResponse,
};
use crate::types::{abbrev_uuid, BillId, ClassId, StudentId, TenantId};
use chrono::Utc;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const FEE_TYPE_COLUMNS: &str = "id, tenant_id, name, description, is_active, created_at";

const STRUCTURE_SELECT: &str = r#"
    SELECT fs.id, fs.tenant_id, fs.fee_type_id, ft.name AS fee_type_name, fs.amount,
           fs.due_date, fs.billing_period, fs.is_active, fs.created_at
    FROM fee_structures fs
    JOIN fee_types ft ON ft.id = fs.fee_type_id
"#;

const BILL_SELECT: &str = r#"
    SELECT b.id, b.tenant_id, b.student_id, u.full_name AS student_name, sp.admission_number,
           b.fee_structure_id, ft.name AS fee_type_name, fs.billing_period, b.amount,
           b.due_date, b.paid_date, b.status, b.razorpay_order_id, b.created_at
    FROM student_bills b
    JOIN student_profiles sp ON sp.id = b.student_id
    JOIN users u ON u.id = sp.user_id
    JOIN fee_structures fs ON fs.id = b.fee_structure_id
    JOIN fee_types ft ON ft.id = fs.fee_type_id
"#;

const PAYMENT_SELECT: &str = r#"
    SELECT fp.id, fp.tenant_id, fp.bill_id, u.full_name AS student_name, ft.name AS fee_type_name,
           fp.amount, fp.payment_method, fp.transaction_id, fp.receipt_number, fp.collected_by,
           fp.payment_date, fp.created_at
    FROM fee_payments fp
    JOIN student_bills b ON b.id = fp.bill_id
    JOIN student_profiles sp ON sp.id = b.student_id
    JOIN users u ON u.id = sp.user_id
    JOIN fee_structures fs ON fs.id = b.fee_structure_id
    JOIN fee_types ft ON ft.id = fs.fee_type_id
"#;

pub struct Fees<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Fees<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    // -- fee types ---------------------------------------------------------

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id), name = %name), err)]
    pub async fn create_fee_type(&mut self, tenant_id: TenantId, name: &str, description: &str) -> Result<FeeTypeDBResponse> {
        let fee_type = sqlx::query_as::<_, FeeTypeDBResponse>(&format!(
            "INSERT INTO fee_types (id, tenant_id, name, description) VALUES ($1, $2, $3, $4) RETURNING {FEE_TYPE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(fee_type)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list_fee_types(&mut self, tenant_id: TenantId) -> Result<Vec<FeeTypeDBResponse>> {
        let fee_types = sqlx::query_as::<_, FeeTypeDBResponse>(&format!(
            "SELECT {FEE_TYPE_COLUMNS} FROM fee_types WHERE tenant_id = $1 AND is_active ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(fee_types)
    }

    #[instrument(skip(self), fields(fee_type_id = %abbrev_uuid(&id)), err)]
    pub async fn update_fee_type(&mut self, id: Uuid, tenant_id: TenantId, name: &str, description: &str) -> Result<FeeTypeDBResponse> {
        let fee_type = sqlx::query_as::<_, FeeTypeDBResponse>(&format!(
            "UPDATE fee_types SET name = $3, description = $4, updated_at = NOW() \
             WHERE id = $1 AND tenant_id = $2 RETURNING {FEE_TYPE_COLUMNS}"
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(fee_type)
    }

    #[instrument(skip(self), fields(fee_type_id = %abbrev_uuid(&id)), err)]
    pub async fn deactivate_fee_type(&mut self, id: Uuid, tenant_id: TenantId) -> Result<bool> {
        let result = sqlx::query("UPDATE fee_types SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // -- fee structures ----------------------------------------------------

    #[instrument(skip(self, request), fields(tenant_id = %abbrev_uuid(&request.tenant_id)), err)]
    pub async fn create_structure(&mut self, request: &FeeStructureCreateDBRequest) -> Result<FeeStructureDBResponse> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO fee_structures (id, tenant_id, fee_type_id, amount, due_date, billing_period) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(id)
            .bind(request.tenant_id)
            .bind(request.fee_type_id)
            .bind(request.amount)
            .bind(request.due_date)
            .bind(&request.billing_period)
            .execute(&mut *self.db)
            .await?;

        for class_id in &request.class_ids {
            sqlx::query("INSERT INTO fee_structure_classes (fee_structure_id, class_id) VALUES ($1, $2)")
                .bind(id)
                .bind(class_id)
                .execute(&mut *self.db)
                .await?;
        }

        self.get_structure(id, request.tenant_id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(structure_id = %abbrev_uuid(&id)), err)]
    pub async fn get_structure(&mut self, id: Uuid, tenant_id: TenantId) -> Result<Option<FeeStructureDBResponse>> {
        let structure = sqlx::query_as::<_, FeeStructureDBResponse>(&format!("{STRUCTURE_SELECT} WHERE fs.id = $1 AND fs.tenant_id = $2"))
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(structure)
    }

    #[instrument(skip(self), fields(structure_id = %abbrev_uuid(&id)), err)]
    pub async fn structure_class_ids(&mut self, id: Uuid) -> Result<Vec<ClassId>> {
        let ids: Vec<ClassId> = sqlx::query_scalar("SELECT class_id FROM fee_structure_classes WHERE fee_structure_id = $1")
            .bind(id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(ids)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list_structures(&mut self, tenant_id: TenantId) -> Result<Vec<FeeStructureDBResponse>> {
        let structures = sqlx::query_as::<_, FeeStructureDBResponse>(&format!(
            "{STRUCTURE_SELECT} WHERE fs.tenant_id = $1 AND fs.is_active ORDER BY fs.due_date"
        ))
        .bind(tenant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(structures)
    }

    #[instrument(skip(self), fields(structure_id = %abbrev_uuid(&id)), err)]
    pub async fn deactivate_structure(&mut self, id: Uuid, tenant_id: TenantId) -> Result<bool> {
        let result = sqlx::query("UPDATE fee_structures SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Create bills for every eligible student that does not yet have one
    /// for this structure. An empty class set means the whole school.
    /// Returns the number of bills created.
    #[instrument(skip(self), fields(structure_id = %abbrev_uuid(&structure_id)), err)]
    pub async fn generate_bills(&mut self, structure_id: Uuid, tenant_id: TenantId) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO student_bills (id, tenant_id, student_id, fee_structure_id, amount, due_date)
            SELECT gen_random_uuid(), $2, sp.id, fs.id, fs.amount, fs.due_date
            FROM fee_structures fs
            JOIN student_profiles sp ON TRUE
            JOIN users u ON u.id = sp.user_id
            WHERE fs.id = $1 AND fs.tenant_id = $2 AND u.tenant_id = $2
              AND (
                    NOT EXISTS (SELECT 1 FROM fee_structure_classes fsc WHERE fsc.fee_structure_id = fs.id)
                    OR sp.class_id IN (SELECT class_id FROM fee_structure_classes fsc WHERE fsc.fee_structure_id = fs.id)
                  )
            ON CONFLICT ON CONSTRAINT student_bills_once_unique DO NOTHING
            "#,
        )
        .bind(structure_id)
        .bind(tenant_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected())
    }

    // -- bills -------------------------------------------------------------

    #[instrument(skip(self), fields(bill_id = %abbrev_uuid(&id)), err)]
    pub async fn get_bill(&mut self, id: BillId, tenant_id: TenantId) -> Result<Option<BillDBResponse>> {
        let bill = sqlx::query_as::<_, BillDBResponse>(&format!("{BILL_SELECT} WHERE b.id = $1 AND b.tenant_id = $2"))
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(bill)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list_bills(
        &mut self,
        tenant_id: TenantId,
        status: Option<BillStatus>,
        class_id: Option<ClassId>,
    ) -> Result<Vec<BillDBResponse>> {
        let bills = sqlx::query_as::<_, BillDBResponse>(&format!(
            "{BILL_SELECT} WHERE b.tenant_id = $1 \
               AND ($2::text IS NULL OR b.status = $2) \
               AND ($3::uuid IS NULL OR sp.class_id = $3) \
             ORDER BY b.due_date"
        ))
        .bind(tenant_id)
        .bind(status)
        .bind(class_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(bills)
    }

    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&student_id)), err)]
    pub async fn list_bills_for_student(&mut self, student_id: StudentId) -> Result<Vec<BillDBResponse>> {
        let bills = sqlx::query_as::<_, BillDBResponse>(&format!("{BILL_SELECT} WHERE b.student_id = $1 ORDER BY b.due_date"))
            .bind(student_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(bills)
    }

    #[instrument(skip(self), fields(bill_id = %abbrev_uuid(&id)), err)]
    pub async fn set_bill_order(&mut self, id: BillId, razorpay_order_id: &str) -> Result<()> {
        sqlx::query("UPDATE student_bills SET razorpay_order_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(razorpay_order_id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(bill_id = %abbrev_uuid(&id)), err)]
    pub async fn mark_bill_paid(&mut self, id: BillId) -> Result<()> {
        sqlx::query("UPDATE student_bills SET status = 'paid', paid_date = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(Utc::now().date_naive())
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    // -- payments ----------------------------------------------------------

    /// Record a payment and mark the bill paid. The amount has already been
    /// validated against the bill by the caller.
    #[instrument(skip(self, request), fields(bill_id = %abbrev_uuid(&request.bill_id)), err)]
    pub async fn create_payment(&mut self, request: &FeePaymentCreateDBRequest) -> Result<FeePaymentDBResponse> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO fee_payments (id, tenant_id, bill_id, amount, payment_method, transaction_id, receipt_number, collected_by, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(id)
        .bind(request.tenant_id)
        .bind(request.bill_id)
        .bind(request.amount)
        .bind(request.payment_method)
        .bind(&request.transaction_id)
        .bind(&request.receipt_number)
        .bind(request.collected_by)
        .bind(&request.notes)
        .execute(&mut *self.db)
        .await?;

        self.mark_bill_paid(request.bill_id).await?;

        self.get_payment(id, request.tenant_id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(payment_id = %abbrev_uuid(&id)), err)]
    pub async fn get_payment(&mut self, id: Uuid, tenant_id: TenantId) -> Result<Option<FeePaymentDBResponse>> {
        let payment = sqlx::query_as::<_, FeePaymentDBResponse>(&format!("{PAYMENT_SELECT} WHERE fp.id = $1 AND fp.tenant_id = $2"))
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(payment)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list_payments(&mut self, tenant_id: TenantId) -> Result<Vec<FeePaymentDBResponse>> {
        let payments = sqlx::query_as::<_, FeePaymentDBResponse>(&format!(
            "{PAYMENT_SELECT} WHERE fp.tenant_id = $1 ORDER BY fp.payment_date DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(payments)
    }
}
