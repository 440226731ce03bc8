use std::fmt;

use tracing::{info, warn};

use crate::{
    error::{PlannerError, Result},
    services::{
        normalizer::ResponseNormalizer,
        request_builder::{build_request, GenerationRequest},
    },
    types::{
        itinerary::Itinerary,
        trip::{TravelMode, TripDetails, TripRequest, UserPreferences},
    },
};

/// Where the planner currently is in the plan/refine/close loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    CollectingTrip,
    SelectingMode,
    /// One generation call is outstanding. `refinement` records which state a
    /// failure falls back to.
    Generating {
        refinement: bool,
    },
    ReviewingItinerary,
    CollectingPreferences,
    Closing,
}

impl WorkflowState {
    pub fn describe(&self) -> &'static str {
        match self {
            WorkflowState::CollectingTrip => "collecting trip details",
            WorkflowState::SelectingMode => "selecting a travel mode",
            WorkflowState::Generating { refinement: false } => "generating an itinerary",
            WorkflowState::Generating { refinement: true } => "regenerating an itinerary",
            WorkflowState::ReviewingItinerary => "reviewing an itinerary",
            WorkflowState::CollectingPreferences => "collecting preferences",
            WorkflowState::Closing => "closing",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Plain state container for one planning session.
///
/// Every action either performs its transition or returns an error; an
/// action that is not permitted in the current state returns
/// [`PlannerError::InvalidTransition`] and changes nothing. Generation itself
/// happens outside: [`select_mode`](Self::select_mode) and
/// [`submit_preferences`](Self::submit_preferences) hand back the request to
/// send, and [`complete_generation`](Self::complete_generation) takes the
/// outcome.
#[derive(Debug, Clone)]
pub struct PlannerWorkflow {
    state: WorkflowState,
    trip: Option<TripDetails>,
    travel_mode: Option<TravelMode>,
    preferences: UserPreferences,
    itinerary: Option<Itinerary>,
    error: Option<String>,
    pending: Option<GenerationRequest>,
}

impl Default for PlannerWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl PlannerWorkflow {
    pub const fn new() -> Self {
        Self {
            state: WorkflowState::CollectingTrip,
            trip: None,
            travel_mode: None,
            preferences: UserPreferences {
                hotel_location: None,
                food_preference: None,
                budget_upgrade: None,
            },
            itinerary: None,
            error: None,
            pending: None,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn trip(&self) -> Option<&TripDetails> {
        self.trip.as_ref()
    }

    /// Mode chosen for the current trip; locked once generation starts.
    pub fn travel_mode(&self) -> Option<TravelMode> {
        self.travel_mode
    }

    /// Last-used preferences, for pre-populating the refinement form.
    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn itinerary(&self) -> Option<&Itinerary> {
        self.itinerary.as_ref()
    }

    /// User-facing text of the most recent failure, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Request currently awaiting its outcome.
    pub fn pending_request(&self) -> Option<&GenerationRequest> {
        self.pending.as_ref()
    }

    /// Accept a submitted trip form and move on to mode selection.
    ///
    /// Clears any previous itinerary, preferences and error first.
    pub fn submit_trip(&mut self, details: TripDetails) -> Result<()> {
        self.expect_state("submit_trip", |state| {
            matches!(
                state,
                WorkflowState::CollectingTrip | WorkflowState::SelectingMode
            )
        })?;

        if let Err(err) = details.validate() {
            self.error = Some(err.user_message());
            return Err(err);
        }

        self.reset();
        info!(
            target: "tripplanner::workflow",
            from = %details.start_city,
            to = %details.destination,
            days = details.day_count(),
            "trip details accepted"
        );
        self.trip = Some(details);
        self.state = WorkflowState::SelectingMode;
        Ok(())
    }

    /// Choose the travel mode and start the initial generation.
    pub fn select_mode(&mut self, travel_mode: TravelMode) -> Result<GenerationRequest> {
        self.expect_state("select_mode", |state| state == WorkflowState::SelectingMode)?;

        let Some(details) = self.trip.clone() else {
            let err = PlannerError::InvalidTrip(
                "trip details are missing, please fill in the trip form again".to_string(),
            );
            warn!(target: "tripplanner::workflow", "mode selected without trip details");
            self.error = Some(err.user_message());
            return Err(err);
        };

        self.travel_mode = Some(travel_mode);
        let request = build_request(&TripRequest::new(details, travel_mode), &self.preferences);
        self.begin_generation(request.clone(), false);
        Ok(request)
    }

    /// Leave the reviewed itinerary in place and open the preference form.
    pub fn begin_refinement(&mut self) -> Result<()> {
        self.expect_state("begin_refinement", |state| {
            state == WorkflowState::ReviewingItinerary
        })?;
        self.error = None;
        self.state = WorkflowState::CollectingPreferences;
        Ok(())
    }

    /// Regenerate with new preferences, keeping the trip and the locked mode.
    pub fn submit_preferences(&mut self, preferences: UserPreferences) -> Result<GenerationRequest> {
        self.expect_state("submit_preferences", |state| {
            state == WorkflowState::CollectingPreferences
        })?;

        let (Some(details), Some(travel_mode)) = (self.trip.clone(), self.travel_mode) else {
            let err = PlannerError::InvalidTrip(
                "the original trip is no longer available, please start a new trip".to_string(),
            );
            warn!(target: "tripplanner::workflow", "refinement submitted without trip or mode");
            self.error = Some(err.user_message());
            return Err(err);
        };

        self.preferences = preferences;
        let request = build_request(&TripRequest::new(details, travel_mode), &self.preferences);
        self.begin_generation(request.clone(), true);
        Ok(request)
    }

    /// Apply the outcome of the outstanding generation call.
    ///
    /// On success the itinerary is replaced wholesale. On failure the error is
    /// recorded, the previous itinerary (if any) is kept, and the workflow
    /// falls back to mode selection or the preference form.
    pub fn complete_generation(&mut self, outcome: Result<String>) -> Result<&Itinerary> {
        let WorkflowState::Generating { refinement } = self.state else {
            return Err(self.invalid("complete_generation"));
        };

        let result = match self.pending.take() {
            Some(request) => outcome
                .and_then(|raw| ResponseNormalizer::for_request(&request).normalize(&raw)),
            None => Err(PlannerError::InvalidTrip(
                "no generation request was in flight".to_string(),
            )),
        };

        match result {
            Ok(itinerary) => {
                info!(
                    target: "tripplanner::workflow",
                    destination = %itinerary.destination_name,
                    travel_mode = %itinerary.travel_mode_used,
                    days = itinerary.day_wise_itinerary.len(),
                    refinement,
                    "itinerary ready"
                );
                self.error = None;
                self.state = WorkflowState::ReviewingItinerary;
                Ok(&*self.itinerary.insert(itinerary))
            }
            Err(err) => {
                warn!(
                    target: "tripplanner::workflow",
                    code = err.error_code(),
                    error = %err,
                    refinement,
                    "generation failed"
                );
                self.error = Some(err.user_message());
                if refinement {
                    self.state = WorkflowState::CollectingPreferences;
                } else {
                    self.travel_mode = None;
                    self.state = WorkflowState::SelectingMode;
                }
                Err(err)
            }
        }
    }

    /// Dismiss the reviewed itinerary and show the closing acknowledgment.
    pub fn close(&mut self) -> Result<()> {
        self.expect_state("close", |state| state == WorkflowState::ReviewingItinerary)?;
        info!(target: "tripplanner::workflow", "plan closed");
        self.state = WorkflowState::Closing;
        Ok(())
    }

    /// End the closing acknowledgment and return to an empty trip form.
    pub fn finish_close(&mut self) -> Result<()> {
        self.expect_state("finish_close", |state| state == WorkflowState::Closing)?;
        self.reset();
        Ok(())
    }

    /// Drop the current plan and start over without the closing acknowledgment.
    pub fn plan_new_trip(&mut self) -> Result<()> {
        self.expect_state("plan_new_trip", |state| {
            matches!(
                state,
                WorkflowState::ReviewingItinerary | WorkflowState::Closing
            )
        })?;
        self.reset();
        Ok(())
    }

    fn begin_generation(&mut self, request: GenerationRequest, refinement: bool) {
        info!(
            target: "tripplanner::workflow",
            travel_mode = %request.travel_mode(),
            days = request.day_count(),
            refinement,
            "generation started"
        );
        self.error = None;
        self.pending = Some(request);
        self.state = WorkflowState::Generating { refinement };
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn expect_state(
        &self,
        action: &'static str,
        allowed: impl Fn(WorkflowState) -> bool,
    ) -> Result<()> {
        if allowed(self.state) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> PlannerError {
        PlannerError::InvalidTransition {
            action,
            state: self.state.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::trip::{Budget, HotelLocation, TravelType};
    use serde_json::{json, Value};

    fn details(start: &str, end: &str) -> TripDetails {
        TripDetails {
            start_city: "Jamshedpur".to_string(),
            destination: "Manali".to_string(),
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            budget: Budget::Medium,
            travel_type: TravelType::Friends,
            interests: "trekking, cafes".to_string(),
        }
    }

    fn response(mode: TravelMode, days: u32) -> String {
        let plans: Vec<Value> = (1..=days)
            .map(|day| json!({ "day": day, "title": format!("Day {day}"), "activities": ["Explore"] }))
            .collect();
        let mut value = json!({
            "destinationName": "Manali",
            "travelModeUsed": mode.as_str(),
            "hotelOptions": [{ "name": "Snow Peak" }, { "name": "River View" }],
            "dayWiseItinerary": plans
        });
        value[mode.routes_field()] = json!([{ "operator": "HRTC", "trainNameAndNumber": "X", "flightNumberAndAirline": "Y" }]);
        value.to_string()
    }

    fn reviewing(mode: TravelMode) -> PlannerWorkflow {
        let mut workflow = PlannerWorkflow::new();
        workflow.submit_trip(details("2024-06-01", "2024-06-03")).unwrap();
        workflow.select_mode(mode).unwrap();
        workflow.complete_generation(Ok(response(mode, 3))).unwrap();
        workflow
    }

    #[test]
    fn test_happy_path_reaches_review() {
        let workflow = reviewing(TravelMode::Bus);
        assert_eq!(workflow.state(), WorkflowState::ReviewingItinerary);
        assert_eq!(workflow.travel_mode(), Some(TravelMode::Bus));
        assert!(workflow.pending_request().is_none());
        assert!(workflow.error().is_none());
        assert_eq!(workflow.itinerary().unwrap().day_wise_itinerary.len(), 3);
    }

    #[test]
    fn test_invalid_trip_stays_on_form() {
        let mut workflow = PlannerWorkflow::new();
        let err = workflow
            .submit_trip(details("2024-06-05", "2024-06-01"))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRIP");
        assert_eq!(workflow.state(), WorkflowState::CollectingTrip);
        assert!(workflow.trip().is_none());
        assert!(workflow.error().is_some());
    }

    #[test]
    fn test_select_mode_returns_mode_specific_request() {
        let mut workflow = PlannerWorkflow::new();
        workflow.submit_trip(details("2024-06-01", "2024-06-05")).unwrap();
        let request = workflow.select_mode(TravelMode::Flight).unwrap();
        assert_eq!(request.travel_mode(), TravelMode::Flight);
        assert_eq!(request.day_count(), 5);
        assert_eq!(
            workflow.state(),
            WorkflowState::Generating { refinement: false }
        );
        assert_eq!(workflow.pending_request(), Some(&request));
    }

    #[test]
    fn test_no_second_generation_while_generating() {
        let mut workflow = PlannerWorkflow::new();
        workflow.submit_trip(details("2024-06-01", "2024-06-02")).unwrap();
        workflow.select_mode(TravelMode::Train).unwrap();
        let err = workflow.select_mode(TravelMode::Bus).unwrap_err();
        assert_eq!(
            err,
            PlannerError::InvalidTransition {
                action: "select_mode",
                state: "generating an itinerary",
            }
        );
        assert_eq!(
            workflow.pending_request().unwrap().travel_mode(),
            TravelMode::Train
        );
    }

    #[test]
    fn test_initial_failure_returns_to_mode_selection() {
        let mut workflow = PlannerWorkflow::new();
        workflow.submit_trip(details("2024-06-01", "2024-06-03")).unwrap();
        workflow.select_mode(TravelMode::Bus).unwrap();
        let err = workflow
            .complete_generation(Err(PlannerError::Timeout(30)))
            .unwrap_err();
        assert_eq!(err, PlannerError::Timeout(30));
        assert_eq!(workflow.state(), WorkflowState::SelectingMode);
        assert_eq!(workflow.travel_mode(), None);
        assert!(workflow.itinerary().is_none());
        assert!(workflow.trip().is_some());
        assert_eq!(
            workflow.error(),
            Some("API request timed out. Please try again.")
        );
    }

    #[test]
    fn test_normalizer_failure_is_surfaced() {
        let mut workflow = PlannerWorkflow::new();
        workflow.submit_trip(details("2024-06-01", "2024-06-03")).unwrap();
        workflow.select_mode(TravelMode::Train).unwrap();
        let err = workflow
            .complete_generation(Ok(response(TravelMode::Flight, 3)))
            .unwrap_err();
        assert_eq!(err.error_code(), "MODE_MISMATCH");
        assert_eq!(workflow.state(), WorkflowState::SelectingMode);
        assert!(workflow.itinerary().is_none());
    }

    #[test]
    fn test_refinement_locks_mode_and_keeps_itinerary_on_failure() {
        let mut workflow = reviewing(TravelMode::Bus);
        let before = workflow.itinerary().cloned();

        workflow.begin_refinement().unwrap();
        assert_eq!(workflow.itinerary().cloned(), before);

        let preferences = UserPreferences {
            hotel_location: Some(HotelLocation::ScenicView),
            ..UserPreferences::default()
        };
        let request = workflow.submit_preferences(preferences).unwrap();
        assert_eq!(request.travel_mode(), TravelMode::Bus);
        assert_eq!(request.preferences, preferences);

        workflow
            .complete_generation(Ok("not json".to_string()))
            .unwrap_err();
        assert_eq!(workflow.state(), WorkflowState::CollectingPreferences);
        assert_eq!(workflow.itinerary().cloned(), before);
        assert_eq!(workflow.travel_mode(), Some(TravelMode::Bus));
        assert_eq!(workflow.preferences(), &preferences);
    }

    #[test]
    fn test_close_and_finish_resets_everything() {
        let mut workflow = reviewing(TravelMode::Train);
        workflow.close().unwrap();
        assert_eq!(workflow.state(), WorkflowState::Closing);
        assert!(workflow.itinerary().is_some());

        workflow.finish_close().unwrap();
        assert_eq!(workflow.state(), WorkflowState::CollectingTrip);
        assert!(workflow.trip().is_none());
        assert!(workflow.itinerary().is_none());
        assert!(workflow.preferences().is_empty());
        assert_eq!(workflow.travel_mode(), None);
    }

    #[test]
    fn test_plan_new_trip_skips_acknowledgment() {
        let mut workflow = reviewing(TravelMode::Flight);
        workflow.plan_new_trip().unwrap();
        assert_eq!(workflow.state(), WorkflowState::CollectingTrip);
        assert!(workflow.itinerary().is_none());
    }

    #[test]
    fn test_new_trip_submission_is_a_hard_reset() {
        let mut workflow = PlannerWorkflow::new();
        workflow.submit_trip(details("2024-06-01", "2024-06-03")).unwrap();
        workflow.select_mode(TravelMode::Bus).unwrap();
        workflow
            .complete_generation(Err(PlannerError::QuotaExceeded("quota".into())))
            .unwrap_err();
        assert!(workflow.error().is_some());

        workflow.submit_trip(details("2024-07-01", "2024-07-02")).unwrap();
        assert!(workflow.error().is_none());
        assert_eq!(workflow.trip().unwrap().day_count(), 2);
    }

    #[test]
    fn test_actions_out_of_order_change_nothing() {
        let mut workflow = PlannerWorkflow::new();
        assert_eq!(
            workflow.close().unwrap_err().error_code(),
            "INVALID_TRANSITION"
        );
        assert!(workflow.begin_refinement().is_err());
        assert!(workflow
            .submit_preferences(UserPreferences::default())
            .is_err());
        assert!(workflow
            .complete_generation(Ok(response(TravelMode::Bus, 1)))
            .is_err());
        assert_eq!(workflow.state(), WorkflowState::CollectingTrip);
        assert!(workflow.error().is_none());
    }
}
