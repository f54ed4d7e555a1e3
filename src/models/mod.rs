pub mod announcement;
pub mod mosque;
pub mod schedule;

pub use announcement::{Announcement, AnnouncementKind};
pub use mosque::{Coordinates, Mosque, School};
pub use schedule::{DailyPrayer, DailySchedule, JummahSession, PrayerSession};
