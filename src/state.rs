use crate::service::PersonService;

#[derive(Clone)]
pub struct AppState {
    pub persons: PersonService,
}

impl AppState {
    pub fn new(persons: PersonService) -> Self {
        Self { persons }
    }
}
