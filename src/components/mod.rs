// Export components
pub mod extraction;
pub mod google_calendar;
pub mod import;
pub mod reconcile;
pub mod schedule;

pub use google_calendar::{CalendarApi, GoogleCalendarClient};
pub use import::{ImportOutcome, ScheduleImporter};
pub use reconcile::{ReconcileReport, Reconciler};
