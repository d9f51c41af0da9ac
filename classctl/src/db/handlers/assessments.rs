//! Database repositories for assignments and exams.

use crate::db::errors::{DbError, Result};
use crate::db::models::assessments::{
    AssignmentCreateDBRequest, AssignmentDBResponse, ConcernDBResponse, ConcernStatus, ExamCreateDBRequest, ExamDBResponse,
    ExamResultDBResponse, ExamUpdateDBRequest, ResultStatus, SubmissionCreateDBRequest, SubmissionDBResponse,
};
use crate::types::{abbrev_uuid, ClassId, StudentId, TeacherId, TenantId};
use chrono::Utc;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const ASSIGNMENT_SELECT: &str = r#"
    SELECT a.id, a.tenant_id, a.teacher_id, a.subject_id, s.name AS subject_name,
           a.title, a.description, a.attachment, a.due_date, a.total_marks,
           (SELECT COUNT(*) FROM assignment_submissions sub WHERE sub.assignment_id = a.id) AS submission_count,
           a.created_at
    FROM assignments a
    JOIN subjects s ON s.id = a.subject_id
"#;

const SUBMISSION_SELECT: &str = r#"
    SELECT sub.id, sub.assignment_id, sub.student_id, u.full_name AS student_name,
           sub.description, sub.attachment, sub.marks_obtained, sub.feedback, sub.status,
           sub.submitted_at, sub.graded_at
    FROM assignment_submissions sub
    JOIN student_profiles sp ON sp.id = sub.student_id
    JOIN users u ON u.id = sp.user_id
"#;

pub struct Assignments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Assignments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(teacher_id = %abbrev_uuid(&request.teacher_id), title = %request.title), err)]
    pub async fn create(&mut self, request: &AssignmentCreateDBRequest) -> Result<AssignmentDBResponse> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO assignments (id, tenant_id, teacher_id, subject_id, title, description, attachment, due_date, total_marks) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(id)
        .bind(request.tenant_id)
        .bind(request.teacher_id)
        .bind(request.subject_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.attachment)
        .bind(request.due_date)
        .bind(request.total_marks)
        .execute(&mut *self.db)
        .await?;

        for class_id in &request.class_ids {
            sqlx::query("INSERT INTO assignment_classes (assignment_id, class_id) VALUES ($1, $2)")
                .bind(id)
                .bind(class_id)
                .execute(&mut *self.db)
                .await?;
        }

        self.get_by_id(id, request.tenant_id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(assignment_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: Uuid, tenant_id: TenantId) -> Result<Option<AssignmentDBResponse>> {
        let assignment = sqlx::query_as::<_, AssignmentDBResponse>(&format!("{ASSIGNMENT_SELECT} WHERE a.id = $1 AND a.tenant_id = $2"))
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(assignment)
    }

    #[instrument(skip(self), fields(teacher_id = %abbrev_uuid(&teacher_id)), err)]
    pub async fn list_for_teacher(&mut self, teacher_id: TeacherId) -> Result<Vec<AssignmentDBResponse>> {
        let assignments =
            sqlx::query_as::<_, AssignmentDBResponse>(&format!("{ASSIGNMENT_SELECT} WHERE a.teacher_id = $1 ORDER BY a.due_date DESC"))
                .bind(teacher_id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(assignments)
    }

    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&class_id)), err)]
    pub async fn list_for_class(&mut self, class_id: ClassId) -> Result<Vec<AssignmentDBResponse>> {
        let assignments = sqlx::query_as::<_, AssignmentDBResponse>(&format!(
            "{ASSIGNMENT_SELECT} JOIN assignment_classes ac ON ac.assignment_id = a.id \
             WHERE ac.class_id = $1 ORDER BY a.due_date DESC"
        ))
        .bind(class_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(assignments)
    }

    #[instrument(skip(self, request), fields(assignment_id = %abbrev_uuid(&request.assignment_id)), err)]
    pub async fn create_submission(&mut self, request: &SubmissionCreateDBRequest) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO assignment_submissions (id, assignment_id, student_id, description, attachment, status) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(request.assignment_id)
        .bind(request.student_id)
        .bind(&request.description)
        .bind(&request.attachment)
        .bind(request.status)
        .execute(&mut *self.db)
        .await?;

        Ok(id)
    }

    #[instrument(skip(self), fields(assignment_id = %abbrev_uuid(&assignment_id)), err)]
    pub async fn list_submissions(&mut self, assignment_id: Uuid) -> Result<Vec<SubmissionDBResponse>> {
        let submissions = sqlx::query_as::<_, SubmissionDBResponse>(&format!(
            "{SUBMISSION_SELECT} WHERE sub.assignment_id = $1 ORDER BY sub.submitted_at"
        ))
        .bind(assignment_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(submissions)
    }

    /// Grade a submission; marks are validated against the assignment's
    /// total_marks by the caller.
    #[instrument(skip(self), fields(submission_id = %abbrev_uuid(&id)), err)]
    pub async fn grade_submission(&mut self, id: Uuid, marks: f64, feedback: &str) -> Result<SubmissionDBResponse> {
        sqlx::query("UPDATE assignment_submissions SET marks_obtained = $2, feedback = $3, status = 'graded', graded_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(marks)
            .bind(feedback)
            .execute(&mut *self.db)
            .await?;

        let submission = sqlx::query_as::<_, SubmissionDBResponse>(&format!("{SUBMISSION_SELECT} WHERE sub.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(submission)
    }

    #[instrument(skip(self), fields(submission_id = %abbrev_uuid(&id)), err)]
    pub async fn get_submission(&mut self, id: Uuid) -> Result<Option<SubmissionDBResponse>> {
        let submission = sqlx::query_as::<_, SubmissionDBResponse>(&format!("{SUBMISSION_SELECT} WHERE sub.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(submission)
    }
}

const EXAM_SELECT: &str = r#"
    SELECT e.id, e.tenant_id, e.teacher_id, e.subject_id, s.name AS subject_name,
           e.title, e.description, e.exam_date, e.start_time, e.end_time, e.room,
           e.max_marks, e.status,
           (SELECT COUNT(*) FROM exam_results r WHERE r.exam_id = e.id) AS total_students,
           (SELECT COUNT(*) FROM exam_results r WHERE r.exam_id = e.id AND r.status != 'pending') AS results_submitted,
           e.created_at
    FROM exams e
    JOIN subjects s ON s.id = e.subject_id
"#;

const RESULT_SELECT: &str = r#"
    SELECT r.id, r.exam_id, r.student_id, u.full_name AS student_name, sp.roll_number,
           r.marks_obtained, r.status, r.remarks, e.max_marks, e.title AS exam_title,
           s.name AS subject_name, r.graded_at
    FROM exam_results r
    JOIN exams e ON e.id = r.exam_id
    JOIN subjects s ON s.id = e.subject_id
    JOIN student_profiles sp ON sp.id = r.student_id
    JOIN users u ON u.id = sp.user_id
"#;

const CONCERN_SELECT: &str = r#"
    SELECT con.id, con.result_id, con.student_id, u.full_name AS student_name,
           e.title AS exam_title, con.concern_text, con.status, con.response,
           con.previous_marks, con.revised_marks, con.created_at, con.reviewed_at
    FROM exam_concerns con
    JOIN exam_results r ON r.id = con.result_id
    JOIN exams e ON e.id = r.exam_id
    JOIN student_profiles sp ON sp.id = con.student_id
    JOIN users u ON u.id = sp.user_id
"#;

pub struct Exams<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Exams<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create the exam and a pending result row for every student of the
    /// assigned classes, so grading progress is countable from day one.
    #[instrument(skip(self, request), fields(teacher_id = %abbrev_uuid(&request.teacher_id), title = %request.title), err)]
    pub async fn create(&mut self, request: &ExamCreateDBRequest) -> Result<ExamDBResponse> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO exams (id, tenant_id, teacher_id, subject_id, title, description, exam_date, start_time, end_time, room, max_marks) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(id)
        .bind(request.tenant_id)
        .bind(request.teacher_id)
        .bind(request.subject_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.exam_date)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(&request.room)
        .bind(request.max_marks)
        .execute(&mut *self.db)
        .await?;

        for class_id in &request.class_ids {
            sqlx::query("INSERT INTO exam_classes (exam_id, class_id) VALUES ($1, $2)")
                .bind(id)
                .bind(class_id)
                .execute(&mut *self.db)
                .await?;

            sqlx::query(
                "INSERT INTO exam_results (id, exam_id, student_id) \
                 SELECT gen_random_uuid(), $1, sp.id FROM student_profiles sp WHERE sp.class_id = $2 \
                 ON CONFLICT ON CONSTRAINT exam_results_once_unique DO NOTHING",
            )
            .bind(id)
            .bind(class_id)
            .execute(&mut *self.db)
            .await?;
        }

        self.get_by_id(id, request.tenant_id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(exam_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: Uuid, tenant_id: TenantId) -> Result<Option<ExamDBResponse>> {
        let exam = sqlx::query_as::<_, ExamDBResponse>(&format!("{EXAM_SELECT} WHERE e.id = $1 AND e.tenant_id = $2"))
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(exam)
    }

    #[instrument(skip(self), fields(teacher_id = %abbrev_uuid(&teacher_id)), err)]
    pub async fn list_for_teacher(&mut self, teacher_id: TeacherId) -> Result<Vec<ExamDBResponse>> {
        let exams = sqlx::query_as::<_, ExamDBResponse>(&format!(
            "{EXAM_SELECT} WHERE e.teacher_id = $1 ORDER BY e.exam_date DESC, e.start_time DESC"
        ))
        .bind(teacher_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(exams)
    }

    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&class_id)), err)]
    pub async fn list_for_class(&mut self, class_id: ClassId) -> Result<Vec<ExamDBResponse>> {
        let exams = sqlx::query_as::<_, ExamDBResponse>(&format!(
            "{EXAM_SELECT} JOIN exam_classes ec ON ec.exam_id = e.id \
             WHERE ec.class_id = $1 ORDER BY e.exam_date DESC, e.start_time DESC"
        ))
        .bind(class_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(exams)
    }

    #[instrument(skip(self, request), fields(exam_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: Uuid, tenant_id: TenantId, request: &ExamUpdateDBRequest) -> Result<ExamDBResponse> {
        let result = sqlx::query(
            r#"
            UPDATE exams SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                exam_date = COALESCE($5, exam_date),
                start_time = COALESCE($6, start_time),
                end_time = COALESCE($7, end_time),
                room = COALESCE($8, room),
                max_marks = COALESCE($9, max_marks),
                status = COALESCE($10, status),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.exam_date)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(&request.room)
        .bind(request.max_marks)
        .bind(request.status)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id, tenant_id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(exam_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: Uuid, tenant_id: TenantId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM exams WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(exam_id = %abbrev_uuid(&exam_id)), err)]
    pub async fn results_for_exam(&mut self, exam_id: Uuid) -> Result<Vec<ExamResultDBResponse>> {
        let results = sqlx::query_as::<_, ExamResultDBResponse>(&format!("{RESULT_SELECT} WHERE r.exam_id = $1 ORDER BY sp.roll_number"))
            .bind(exam_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(results)
    }

    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&student_id)), err)]
    pub async fn results_for_student(&mut self, student_id: StudentId) -> Result<Vec<ExamResultDBResponse>> {
        let results = sqlx::query_as::<_, ExamResultDBResponse>(&format!(
            "{RESULT_SELECT} WHERE r.student_id = $1 ORDER BY e.exam_date DESC"
        ))
        .bind(student_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(results)
    }

    #[instrument(skip(self), fields(result_id = %abbrev_uuid(&id)), err)]
    pub async fn get_result(&mut self, id: Uuid) -> Result<Option<ExamResultDBResponse>> {
        let result = sqlx::query_as::<_, ExamResultDBResponse>(&format!("{RESULT_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(result)
    }

    /// Grade one result. `marks = None` marks the student absent.
    #[instrument(skip(self), fields(result_id = %abbrev_uuid(&id)), err)]
    pub async fn grade_result(&mut self, id: Uuid, marks: Option<f64>, remarks: &str) -> Result<ExamResultDBResponse> {
        let status = if marks.is_some() { ResultStatus::Graded } else { ResultStatus::Absent };

        sqlx::query("UPDATE exam_results SET marks_obtained = $2, status = $3, remarks = $4, graded_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(marks)
            .bind(status)
            .bind(remarks)
            .execute(&mut *self.db)
            .await?;

        self.get_result(id).await?.ok_or(DbError::NotFound)
    }

    /// A student raises a concern; the marks at raise time are snapshotted
    /// so a later revision is auditable.
    #[instrument(skip(self, concern_text), fields(result_id = %abbrev_uuid(&result_id)), err)]
    pub async fn create_concern(&mut self, result_id: Uuid, student_id: StudentId, concern_text: &str) -> Result<Uuid> {
        let previous_marks: Option<f64> = sqlx::query_scalar("SELECT marks_obtained FROM exam_results WHERE id = $1")
            .bind(result_id)
            .fetch_one(&mut *self.db)
            .await?;

        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO exam_concerns (id, result_id, student_id, concern_text, previous_marks) VALUES ($1, $2, $3, $4, $5)")
            .bind(id)
            .bind(result_id)
            .bind(student_id)
            .bind(concern_text)
            .bind(previous_marks)
            .execute(&mut *self.db)
            .await?;

        Ok(id)
    }

    #[instrument(skip(self), fields(concern_id = %abbrev_uuid(&id)), err)]
    pub async fn get_concern(&mut self, id: Uuid) -> Result<Option<ConcernDBResponse>> {
        let concern = sqlx::query_as::<_, ConcernDBResponse>(&format!("{CONCERN_SELECT} WHERE con.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(concern)
    }

    #[instrument(skip(self), fields(teacher_id = %abbrev_uuid(&teacher_id)), err)]
    pub async fn list_concerns_for_teacher(&mut self, teacher_id: TeacherId) -> Result<Vec<ConcernDBResponse>> {
        let concerns = sqlx::query_as::<_, ConcernDBResponse>(&format!(
            "{CONCERN_SELECT} WHERE e.teacher_id = $1 ORDER BY con.created_at DESC"
        ))
        .bind(teacher_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(concerns)
    }

    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&student_id)), err)]
    pub async fn list_concerns_for_student(&mut self, student_id: StudentId) -> Result<Vec<ConcernDBResponse>> {
        let concerns = sqlx::query_as::<_, ConcernDBResponse>(&format!(
            "{CONCERN_SELECT} WHERE con.student_id = $1 ORDER BY con.created_at DESC"
        ))
        .bind(student_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(concerns)
    }

    /// Review a concern. Resolving with revised marks re-grades the
    /// underlying result in the same transaction scope.
    #[instrument(skip(self, response), fields(concern_id = %abbrev_uuid(&id), status = ?status), err)]
    pub async fn review_concern(
        &mut self,
        id: Uuid,
        reviewer: TeacherId,
        status: ConcernStatus,
        response: &str,
        revised_marks: Option<f64>,
    ) -> Result<ConcernDBResponse> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE exam_concerns SET status = $2, response = $3, revised_marks = $4, reviewed_by = $5, reviewed_at = $6, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(response)
        .bind(revised_marks)
        .bind(reviewer)
        .bind(now)
        .execute(&mut *self.db)
        .await?;

        if status == ConcernStatus::Resolved {
            if let Some(marks) = revised_marks {
                sqlx::query(
                    "UPDATE exam_results SET marks_obtained = $2, status = 'graded', graded_at = $3, updated_at = NOW() \
                     WHERE id = (SELECT result_id FROM exam_concerns WHERE id = $1)",
                )
                .bind(id)
                .bind(marks)
                .bind(now)
                .execute(&mut *self.db)
                .await?;
            }
        }

        self.get_concern(id).await?.ok_or(DbError::NotFound)
    }
}
