use crate::wire::HealthRes;

/// Health check shared by the journal API and its clients.
pub struct HealthService;

impl HealthService {
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Ambulance Assistant is alive".into(),
        }
    }
}
