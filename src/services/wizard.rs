use serde::{Deserialize, Serialize};

use crate::errors::{QuotationError, Result};
use crate::models::catalog::{CatalogEntity, Destination, Location};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    DestinationSelection,
    LocationSelection,
    PackageSelection,
    Review,
}

impl WizardStep {
    fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::DestinationSelection => Some(WizardStep::LocationSelection),
            WizardStep::LocationSelection => Some(WizardStep::PackageSelection),
            WizardStep::PackageSelection => Some(WizardStep::Review),
            WizardStep::Review => None,
        }
    }

    fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::DestinationSelection => None,
            WizardStep::LocationSelection => Some(WizardStep::DestinationSelection),
            WizardStep::PackageSelection => Some(WizardStep::LocationSelection),
            WizardStep::Review => Some(WizardStep::PackageSelection),
        }
    }
}

/// Step machine for assembling a quotation. Steps only change through
/// [`WizardController::next_step`] and [`WizardController::prev_step`].
#[derive(Debug, Clone)]
pub struct WizardController {
    step: WizardStep,
    destination: Option<Destination>,
    location: Option<Location>,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    pub fn new() -> Self {
        Self {
            step: WizardStep::DestinationSelection,
            destination: None,
            location: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Picking a different destination discards a location that belonged
    /// to the previous one.
    pub fn record_destination(&mut self, destination: Destination) {
        let changed = self
            .destination
            .as_ref()
            .map_or(true, |current| current.meta.id != destination.meta.id);
        if changed {
            self.location = None;
        }
        self.destination = Some(destination);
    }

    pub fn record_location(&mut self, location: Location) -> Result<()> {
        let destination = self.destination.as_ref().ok_or_else(|| {
            QuotationError::invariant("Choose a destination before choosing a location")
        })?;
        if location.destination_id != destination.meta.id {
            return Err(QuotationError::validation(
                "location_id",
                format!("{} is not part of {}", location.name, destination.name),
            ));
        }
        self.location = Some(location);
        Ok(())
    }

    pub fn next_step(&mut self) -> Result<WizardStep> {
        match self.step {
            WizardStep::DestinationSelection if self.destination.is_none() => {
                return Err(QuotationError::invariant(
                    "Choose a destination to continue",
                ));
            }
            WizardStep::LocationSelection if self.location.is_none() => {
                return Err(QuotationError::invariant("Choose a location to continue"));
            }
            _ => {}
        }

        let next = self.step.next().ok_or_else(|| {
            QuotationError::invariant("The quotation is ready for review; finalize it to save")
        })?;
        self.step = next;
        Ok(next)
    }

    /// Going back keeps everything already recorded. At the first step this
    /// is a no-op.
    pub fn prev_step(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    pub fn is_at_review(&self) -> bool {
        self.step == WizardStep::Review
    }

    /// Returns to the step where a vanished entity is chosen and drops the
    /// stale choice. Never moves forward.
    pub fn recover_from_not_found(&mut self, entity: &str) -> WizardStep {
        let target = if entity == Destination::LABEL {
            self.destination = None;
            self.location = None;
            WizardStep::DestinationSelection
        } else if entity == Location::LABEL {
            self.location = None;
            WizardStep::LocationSelection
        } else {
            WizardStep::PackageSelection
        };
        self.step = self.step.min(target);
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{CatalogMeta, Region};

    fn destination(id: &str) -> Destination {
        Destination {
            meta: CatalogMeta {
                id: id.to_string(),
                ..Default::default()
            },
            name: "Rajasthan".to_string(),
            category: "Heritage".to_string(),
            region: Region::Domestic,
            description: String::new(),
            image_url: None,
        }
    }

    fn location(destination_id: &str) -> Location {
        Location {
            meta: CatalogMeta {
                id: "loc-udaipur".to_string(),
                ..Default::default()
            },
            destination_id: destination_id.to_string(),
            name: "Udaipur".to_string(),
        }
    }

    #[test]
    fn test_starts_at_destination_selection() {
        assert_eq!(WizardController::new().step(), WizardStep::DestinationSelection);
    }

    #[test]
    fn test_next_without_destination_is_rejected() {
        let mut wizard = WizardController::new();
        assert!(matches!(
            wizard.next_step(),
            Err(QuotationError::StateInvariant(_))
        ));
        assert_eq!(wizard.step(), WizardStep::DestinationSelection);
    }

    #[test]
    fn test_next_without_location_is_rejected() {
        let mut wizard = WizardController::new();
        wizard.record_destination(destination("dest-1"));
        assert_eq!(wizard.next_step().unwrap(), WizardStep::LocationSelection);
        assert!(wizard.next_step().is_err());
        assert_eq!(wizard.step(), WizardStep::LocationSelection);
    }

    #[test]
    fn test_full_forward_path_and_terminal_review() {
        let mut wizard = WizardController::new();
        wizard.record_destination(destination("dest-1"));
        wizard.next_step().unwrap();
        wizard.record_location(location("dest-1")).unwrap();
        wizard.next_step().unwrap();
        assert_eq!(wizard.next_step().unwrap(), WizardStep::Review);
        assert!(wizard.is_at_review());
        assert!(wizard.next_step().is_err());
        assert_eq!(wizard.step(), WizardStep::Review);
    }

    #[test]
    fn test_going_back_keeps_selections() {
        let mut wizard = WizardController::new();
        wizard.record_destination(destination("dest-1"));
        wizard.next_step().unwrap();
        wizard.record_location(location("dest-1")).unwrap();
        wizard.next_step().unwrap();

        assert_eq!(wizard.prev_step(), WizardStep::LocationSelection);
        assert_eq!(wizard.prev_step(), WizardStep::DestinationSelection);
        assert_eq!(wizard.prev_step(), WizardStep::DestinationSelection);
        assert!(wizard.destination().is_some());
        assert!(wizard.location().is_some());

        wizard.next_step().unwrap();
        assert_eq!(wizard.next_step().unwrap(), WizardStep::PackageSelection);
    }

    #[test]
    fn test_location_must_belong_to_destination() {
        let mut wizard = WizardController::new();
        wizard.record_destination(destination("dest-1"));
        assert!(wizard.record_location(location("dest-2")).is_err());
        assert!(wizard.location().is_none());
    }

    #[test]
    fn test_changing_destination_clears_location() {
        let mut wizard = WizardController::new();
        wizard.record_destination(destination("dest-1"));
        wizard.record_location(location("dest-1")).unwrap();
        wizard.record_destination(destination("dest-1"));
        assert!(wizard.location().is_some());
        wizard.record_destination(destination("dest-2"));
        assert!(wizard.location().is_none());
    }

    #[test]
    fn test_missing_location_returns_to_location_step() {
        let mut wizard = WizardController::new();
        wizard.record_destination(destination("dest-1"));
        wizard.next_step().unwrap();
        wizard.record_location(location("dest-1")).unwrap();
        wizard.next_step().unwrap();
        wizard.next_step().unwrap();

        assert_eq!(
            wizard.recover_from_not_found("Location"),
            WizardStep::LocationSelection
        );
        assert!(wizard.location().is_none());
        assert!(wizard.destination().is_some());
        assert!(wizard.next_step().is_err());
    }

    #[test]
    fn test_missing_hotel_never_moves_forward() {
        let mut wizard = WizardController::new();
        assert_eq!(
            wizard.recover_from_not_found("Hotel"),
            WizardStep::DestinationSelection
        );
    }
}
