use crate::config::AppConfig;
use crate::services::calendar::CalendarProvider;
use crate::services::sessions::SessionStore;

pub struct AppState {
    pub config: AppConfig,
    pub calendar: Box<dyn CalendarProvider>,
    pub sessions: SessionStore,
}
