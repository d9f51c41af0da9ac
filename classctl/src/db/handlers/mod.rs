//! Database repositories, one per aggregate.

pub mod academics;
pub mod assessments;
pub mod classes;
pub mod fees;
pub mod otp;
pub mod plans;
pub mod students;
pub mod subjects;
pub mod subscriptions;
pub mod teachers;
pub mod tenants;
pub mod timetables;
pub mod users;

pub use academics::{Announcements, Attendance};
pub use assessments::{Assignments, Exams};
pub use classes::Classes;
pub use fees::Fees;
pub use otp::OneTimeCodes;
pub use plans::Plans;
pub use students::Students;
pub use subjects::Subjects;
pub use subscriptions::Subscriptions;
pub use teachers::Teachers;
pub use tenants::Tenants;
pub use timetables::{Timetables, TimeSlots};
pub use users::Users;
