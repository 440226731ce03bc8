use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::workflow::{PlannerWorkflow, WorkflowState};
use crate::{
    config::PlannerConfig,
    error::Result,
    services::generation_client::{GenerationClient, TextGenerator},
    types::{
        itinerary::Itinerary,
        trip::{TravelMode, TripDetails, UserPreferences},
    },
};

/// What every reader sees once the closing acknowledgment has elapsed.
static CLEARED: PlannerWorkflow = PlannerWorkflow::new();

/// Pending auto-reset after a plan is closed.
#[derive(Debug, Clone, Copy)]
struct ResetTimer {
    deadline: Instant,
}

impl ResetTimer {
    fn start(delay: Duration) -> Self {
        Self {
            deadline: Instant::now() + delay,
        }
    }

    fn is_due(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Drives a [`PlannerWorkflow`] with a generator and owns the auto-reset timer.
///
/// Generation runs inline: `select_mode` and `submit_preferences` hold the
/// session mutably until the outcome is applied, so there is never more than
/// one request in flight.
///
/// The reset after `close` is a deadline, not a background task. Once it has
/// passed, every accessor reports the cleared planner and the next action
/// applies the reset to the owned workflow. Tearing down or dropping the
/// session discards the deadline, so nothing can fire afterwards.
pub struct PlannerSession<G> {
    workflow: PlannerWorkflow,
    generator: G,
    close_delay: Duration,
    reset_timer: Option<ResetTimer>,
}

impl PlannerSession<GenerationClient> {
    /// Session backed by the HTTP generation client.
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(GenerationClient::new(config)).with_close_delay(config.close_delay)
    }
}

impl<G: TextGenerator> PlannerSession<G> {
    pub fn new(generator: G) -> Self {
        Self {
            workflow: PlannerWorkflow::new(),
            generator,
            close_delay: crate::config::DEFAULT_CLOSE_DELAY,
            reset_timer: None,
        }
    }

    pub fn with_close_delay(mut self, close_delay: Duration) -> Self {
        self.close_delay = close_delay;
        self
    }

    /// Current planner as a reader should see it, with an elapsed reset applied.
    pub fn workflow(&self) -> &PlannerWorkflow {
        match self.reset_timer {
            Some(timer) if timer.is_due() => &CLEARED,
            _ => &self.workflow,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.workflow().state()
    }

    pub fn itinerary(&self) -> Option<&Itinerary> {
        self.workflow().itinerary()
    }

    pub fn error(&self) -> Option<&str> {
        self.workflow().error()
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Whether a reset is scheduled and has not yet elapsed.
    pub fn has_pending_reset(&self) -> bool {
        self.reset_timer.map_or(false, |timer| !timer.is_due())
    }

    pub fn submit_trip(&mut self, details: TripDetails) -> Result<()> {
        self.poll_reset();
        self.workflow.submit_trip(details)
    }

    /// Pick the travel mode and run the initial generation to completion.
    pub async fn select_mode(&mut self, travel_mode: TravelMode) -> Result<&Itinerary> {
        self.poll_reset();
        let request = self.workflow.select_mode(travel_mode)?;
        let outcome = self.generator.generate(&request).await;
        self.workflow.complete_generation(outcome)
    }

    pub fn begin_refinement(&mut self) -> Result<()> {
        self.poll_reset();
        self.workflow.begin_refinement()
    }

    /// Regenerate with `preferences`; the travel mode stays locked.
    pub async fn submit_preferences(&mut self, preferences: UserPreferences) -> Result<&Itinerary> {
        self.poll_reset();
        let request = self.workflow.submit_preferences(preferences)?;
        let outcome = self.generator.generate(&request).await;
        self.workflow.complete_generation(outcome)
    }

    /// Start over immediately. From `Closing` this also cancels the pending reset.
    pub fn plan_new_trip(&mut self) -> Result<()> {
        self.poll_reset();
        self.workflow.plan_new_trip()?;
        self.cancel_pending_reset();
        Ok(())
    }

    /// Close the reviewed plan and schedule the reset after the close delay.
    pub fn close(&mut self) -> Result<()> {
        self.workflow.close()?;
        debug!(target: "tripplanner::session", delay_ms = self.close_delay.as_millis() as u64, "reset scheduled");
        self.reset_timer = Some(ResetTimer::start(self.close_delay));
        Ok(())
    }

    /// Wait for the scheduled reset and apply it.
    ///
    /// Returns `false` when no reset is pending.
    pub async fn wait_for_reset(&mut self) -> bool {
        let Some(timer) = self.reset_timer else {
            return false;
        };
        tokio::time::sleep_until(tokio::time::Instant::from_std(timer.deadline)).await;
        self.poll_reset()
    }

    /// Apply the scheduled reset to the owned workflow if its delay has elapsed.
    pub fn poll_reset(&mut self) -> bool {
        match self.reset_timer {
            Some(timer) if timer.is_due() => {
                self.reset_timer = None;
                self.apply_reset()
            }
            _ => false,
        }
    }

    /// Cancel a reset that has not elapsed yet. Returns whether one was pending.
    pub fn cancel_pending_reset(&mut self) -> bool {
        if self.poll_reset() {
            return false;
        }
        match self.reset_timer.take() {
            Some(_) => {
                debug!(target: "tripplanner::session", "pending reset cancelled");
                true
            }
            None => false,
        }
    }

    /// Release the session's pending reset. No transition happens afterwards.
    pub fn teardown(&mut self) {
        if self.cancel_pending_reset() {
            info!(target: "tripplanner::session", state = %self.state(), "session torn down with a pending reset");
        }
    }

    fn apply_reset(&mut self) -> bool {
        match self.workflow.finish_close() {
            Ok(()) => {
                info!(target: "tripplanner::session", "closing acknowledgment elapsed, planner reset");
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::request_builder::GenerationRequest;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Echoes a well-formed itinerary for whatever was requested and records requests.
    #[derive(Default)]
    struct EchoGenerator {
        seen: Arc<Mutex<Vec<GenerationRequest>>>,
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            let mode = request.travel_mode();
            let plans: Vec<Value> = (1..=request.day_count())
                .map(|day| json!({ "day": day, "title": "Explore", "activities": [] }))
                .collect();
            let mut value = json!({
                "destinationName": request.trip.details.destination,
                "travelModeUsed": mode.as_str(),
                "hotelOptions": [{ "name": "A" }, { "name": "B" }],
                "dayWiseItinerary": plans
            });
            value[mode.routes_field()] = json!([{ "operator": "Op", "trainNameAndNumber": "T", "flightNumberAndAirline": "F" }]);
            Ok(value.to_string())
        }
    }

    fn details() -> TripDetails {
        TripDetails {
            start_city: "Jamshedpur".to_string(),
            destination: "Manali".to_string(),
            start_date: "2024-06-01".parse().unwrap(),
            end_date: "2024-06-02".parse().unwrap(),
            budget: crate::types::trip::Budget::Low,
            travel_type: crate::types::trip::TravelType::Solo,
            interests: String::new(),
        }
    }

    async fn reviewed(delay: Duration) -> PlannerSession<EchoGenerator> {
        let mut session = PlannerSession::new(EchoGenerator::default()).with_close_delay(delay);
        session.submit_trip(details()).unwrap();
        session.select_mode(TravelMode::Train).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_close_resets_after_delay() {
        let mut session = reviewed(Duration::from_millis(20)).await;
        session.close().unwrap();
        assert_eq!(session.state(), WorkflowState::Closing);
        assert!(!session.poll_reset());

        assert!(session.wait_for_reset().await);
        assert_eq!(session.state(), WorkflowState::CollectingTrip);
        assert!(session.itinerary().is_none());
        assert!(!session.has_pending_reset());
    }

    #[tokio::test]
    async fn test_elapsed_reset_is_visible_without_polling() {
        let mut session = reviewed(Duration::from_millis(20)).await;
        session.close().unwrap();
        assert!(session.itinerary().is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(session.state(), WorkflowState::CollectingTrip);
        assert!(session.itinerary().is_none());
        assert!(session.workflow().trip().is_none());
        assert!(session.workflow().preferences().is_empty());
        assert!(!session.has_pending_reset());
    }

    #[tokio::test]
    async fn test_poll_applies_elapsed_reset() {
        let mut session = reviewed(Duration::from_millis(10)).await;
        session.close().unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(session.poll_reset());
        assert_eq!(session.state(), WorkflowState::CollectingTrip);
    }

    #[tokio::test]
    async fn test_teardown_cancels_reset() {
        let mut session = reviewed(Duration::from_millis(10)).await;
        session.close().unwrap();
        session.teardown();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!session.poll_reset());
        assert!(!session.wait_for_reset().await);
        assert_eq!(session.state(), WorkflowState::Closing);
    }

    #[tokio::test]
    async fn test_plan_new_trip_while_closing_cancels_timer() {
        let mut session = reviewed(Duration::from_secs(3)).await;
        session.close().unwrap();
        session.plan_new_trip().unwrap();
        assert!(!session.has_pending_reset());
        assert_eq!(session.state(), WorkflowState::CollectingTrip);
    }

    #[tokio::test]
    async fn test_refinement_reuses_locked_mode() {
        let mut session = reviewed(Duration::from_secs(3)).await;
        session.begin_refinement().unwrap();
        let preferences = UserPreferences {
            budget_upgrade: Some(true),
            ..UserPreferences::default()
        };
        let itinerary = session.submit_preferences(preferences).await.unwrap();
        assert_eq!(itinerary.travel_mode_used, TravelMode::Train);

        let seen = session.generator().seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].travel_mode(), TravelMode::Train);
        assert!(seen[1].preferences.allows_upgrade());
    }

    #[test]
    fn test_close_requires_reviewed_itinerary() {
        let mut session = PlannerSession::new(EchoGenerator::default());
        let err = session.close().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(!session.has_pending_reset());
    }
}
