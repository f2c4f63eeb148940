// Models module - Database entity representations

pub mod attendance;
pub mod event;
pub mod registration;
pub mod user;

pub use attendance::{Attendance, AttendanceContext, AttendanceWithUser, MintedNft};
pub use event::EventNftInfo;
pub use registration::RegistrationContext;
pub use user::{Attendee, UserSummary};
