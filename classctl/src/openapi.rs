//! OpenAPI documentation assembly.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "classctl API",
        description = "Multi-tenant school management platform: accounts, classrooms, timetables, assessments, fees and subscriptions."
    ),
    paths(
        // accounts
        handlers::accounts::login,
        handlers::accounts::logout,
        handlers::accounts::get_profile,
        handlers::accounts::update_profile,
        handlers::accounts::upload_profile_image,
        handlers::accounts::change_password,
        handlers::accounts::forgot_password,
        handlers::accounts::resend_forgot_otp,
        handlers::accounts::reset_password,
        handlers::accounts::admin_signup,
        handlers::accounts::admin_verify_email,
        handlers::accounts::admin_resend_otp,
        // users
        handlers::teachers::create_teacher,
        handlers::teachers::list_teachers,
        handlers::teachers::update_teacher,
        handlers::teachers::delete_teacher,
        handlers::teachers::get_own_profile,
        handlers::teachers::update_own_profile,
        handlers::students::create_student,
        handlers::students::list_students,
        handlers::students::get_student,
        handlers::students::update_student,
        handlers::students::delete_student,
        handlers::students::get_own_profile,
        handlers::students::update_own_profile,
        // classroom
        handlers::classroom::create_class,
        handlers::classroom::list_classes,
        handlers::classroom::class_dropdown,
        handlers::classroom::class_detail,
        handlers::classroom::update_class,
        handlers::classroom::delete_class,
        handlers::classroom::teacher_class_dropdown,
        handlers::subjects::create_subject,
        handlers::subjects::list_subjects,
        handlers::subjects::teacher_subject_dropdown,
        handlers::subjects::update_subject,
        handlers::subjects::delete_subject,
        // timetables
        handlers::timetables::create_timeslot,
        handlers::timetables::list_timeslots,
        handlers::timetables::update_timeslot,
        handlers::timetables::delete_timeslot,
        handlers::timetables::create_timetable,
        handlers::timetables::list_timetables,
        handlers::timetables::get_matrix,
        handlers::timetables::create_entry,
        handlers::timetables::update_entry,
        handlers::timetables::delete_entry,
        handlers::timetables::clear_timetable,
        handlers::timetables::teacher_timetable,
        handlers::timetables::student_timetable,
        // subscriptions
        handlers::subscriptions::create_plan,
        handlers::subscriptions::list_plans,
        handlers::subscriptions::update_plan,
        handlers::subscriptions::delete_plan,
        handlers::subscriptions::active_plans,
        handlers::subscriptions::tenant_subscriptions,
        handlers::subscriptions::subscription_status,
        handlers::subscriptions::create_order,
        handlers::subscriptions::verify_payment,
        // superadmin
        handlers::superadmin::list_tenants,
        handlers::superadmin::set_tenant_status,
        handlers::superadmin::delete_tenant,
        handlers::superadmin::billing_overview,
        // academics
        handlers::academics::create_announcement,
        handlers::academics::admin_announcements,
        handlers::academics::audience_announcements,
        handlers::academics::update_announcement,
        handlers::academics::delete_announcement,
        handlers::academics::mark_attendance,
        handlers::academics::class_attendance,
        handlers::academics::student_monthly_attendance,
        // assignments
        handlers::assignments::create_assignment,
        handlers::assignments::teacher_assignments,
        handlers::assignments::assignment_submissions,
        handlers::assignments::grade_submission,
        handlers::assignments::student_assignments,
        handlers::assignments::submit_assignment,
        // exams
        handlers::exams::create_exam,
        handlers::exams::teacher_exams,
        handlers::exams::update_exam,
        handlers::exams::delete_exam,
        handlers::exams::exam_results,
        handlers::exams::grade_result,
        handlers::exams::student_exams,
        handlers::exams::student_results,
        handlers::exams::raise_concern,
        handlers::exams::student_concerns,
        handlers::exams::teacher_concerns,
        handlers::exams::review_concern,
        // finance
        handlers::fees::create_fee_type,
        handlers::fees::list_fee_types,
        handlers::fees::update_fee_type,
        handlers::fees::delete_fee_type,
        handlers::fees::create_fee_structure,
        handlers::fees::list_fee_structures,
        handlers::fees::delete_fee_structure,
        handlers::fees::generate_bills,
        handlers::fees::list_bills,
        handlers::fees::get_bill,
        handlers::fees::record_payment,
        handlers::fees::list_payments,
        handlers::fees::get_payment,
        handlers::fees::student_bills,
        handlers::fees::create_bill_order,
        handlers::fees::verify_bill_payment,
    ),
    components(schemas(
        models::auth::LoginRequest,
        models::auth::LoginBody,
        models::auth::AuthUserResponse,
        models::auth::MessageResponse,
        models::auth::ChangePasswordRequest,
        models::auth::ForgotPasswordRequest,
        models::auth::ResetPasswordRequest,
        models::auth::AdminSignupRequest,
        models::auth::VerifyEmailRequest,
        models::auth::ProfileImageResponse,
        models::auth::SubscriptionStatusResponse,
        models::users::CurrentUser,
        models::users::UserResponse,
        models::users::ProfileUpdateRequest,
        models::users::TeacherCreate,
        models::users::TeacherUpdate,
        models::users::TeacherResponse,
        models::users::StudentCreate,
        models::users::StudentUpdate,
        models::users::StudentResponse,
        models::tenants::TenantResponse,
        models::tenants::TenantOverviewResponse,
        models::tenants::SetTenantStatusRequest,
        models::subscriptions::PlanCreate,
        models::subscriptions::PlanUpdate,
        models::subscriptions::PlanResponse,
        models::subscriptions::SubscriptionResponse,
        models::subscriptions::OrderBody,
        models::subscriptions::CreateOrderResponse,
        models::subscriptions::VerifyPaymentRequest,
        models::subscriptions::VerifyPaymentResponse,
        models::subscriptions::BillingOverviewResponse,
        models::classroom::ClassCreate,
        models::classroom::ClassUpdate,
        models::classroom::ClassResponse,
        models::classroom::ClassListItem,
        models::classroom::ClassDropdownItem,
        models::classroom::ClassDetailResponse,
        models::classroom::SubjectCreate,
        models::classroom::SubjectResponse,
        models::timetables::TimeSlotRequest,
        models::timetables::TimeSlotResponse,
        models::timetables::TimetableCreate,
        models::timetables::TimetableResponse,
        models::timetables::EntryRequest,
        models::timetables::EntryResponse,
        models::timetables::ClearTimetableRequest,
        models::timetables::MatrixCell,
        models::timetables::TimetableMatrix,
        models::academics::AnnouncementCreate,
        models::academics::AnnouncementUpdate,
        models::academics::AnnouncementResponse,
        models::academics::AttendanceMark,
        models::academics::AttendanceMarkRequest,
        models::academics::AttendanceResponse,
        models::assessments::AssignmentCreate,
        models::assessments::AssignmentResponse,
        models::assessments::SubmissionCreate,
        models::assessments::SubmissionResponse,
        models::assessments::GradeSubmissionRequest,
        models::assessments::ExamCreate,
        models::assessments::ExamUpdate,
        models::assessments::ExamResponse,
        models::assessments::ExamResultResponse,
        models::assessments::GradeResultRequest,
        models::assessments::ConcernCreate,
        models::assessments::ConcernReviewRequest,
        models::assessments::ConcernResponse,
        models::fees::FeeTypeCreate,
        models::fees::FeeTypeResponse,
        models::fees::FeeStructureCreate,
        models::fees::FeeStructureResponse,
        models::fees::GenerateBillsResponse,
        models::fees::BillResponse,
        models::fees::RecordPaymentRequest,
        models::fees::FeePaymentResponse,
        models::fees::FeeOrderResponse,
        models::fees::VerifyFeePaymentRequest,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi as _;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().unwrap();
        assert!(json.contains("/classroom/timetables/{timetable_id}/matrix/"));
        assert!(json.contains("/subscriptions/verify-payment/"));
    }
}
