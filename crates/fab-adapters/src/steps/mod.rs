//! Steps concretos del flujo clásico RTL → GDSII.

pub mod drc;
pub mod floorplan;
pub mod placement;
pub mod routing;
pub mod stream_out;
pub mod synthesis;

pub use drc::DrcStep;
pub use floorplan::FloorplanStep;
pub use placement::PlacementStep;
pub use routing::RoutingStep;
pub use stream_out::StreamOutStep;
pub use synthesis::SynthesisStep;

use fab_core::Step;

/// El flujo clásico completo, en orden.
pub fn classic_flow() -> Vec<Box<dyn Step>> {
    vec![Box::new(SynthesisStep),
         Box::new(FloorplanStep),
         Box::new(PlacementStep),
         Box::new(RoutingStep),
         Box::new(StreamOutStep),
         Box::new(DrcStep)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use fab_core::{Flow, InMemoryEventStore, InMemoryRunStore};

    #[test]
    fn classic_flow_aggregates_a_consistent_schema() {
        let steps = classic_flow();
        let schema = Flow::<InMemoryEventStore, InMemoryRunStore>::aggregate_schema(&steps).unwrap();
        // variables compartidas (OPENROAD_BIN, MAGIC_BIN) no duplican entradas
        assert!(schema.get("OPENROAD_BIN").is_some());
        assert!(schema.get("MAGIC_BIN").is_some());
        assert!(schema.get("DESIGN_NAME").is_some());
        assert!(schema.get("CLOCK_PERIOD").is_some());
    }

    #[test]
    fn step_identities_are_unique() {
        let steps = classic_flow();
        let mut ids: Vec<&str> = steps.iter().map(|s| s.id()).collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }
}
