//! Output order equals input order whatever the completion order

use crate::property::support::{dispatch, Scripted};
use proptest::prelude::*;
use rack::dispatch::ExitStatus;
use rack::resource::Payload;

fn case() -> impl Strategy<Value = (Vec<(u64, bool)>, usize)> {
    (prop::collection::vec((0u64..6, any::<bool>()), 0..12), 1usize..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_resources_stay_in_input_order((items, workers) in case()) {
        let command = Scripted {
            delays_ms: items.iter().map(|(d, _)| *d).collect(),
            failures: items.iter().map(|(_, f)| *f).collect(),
        };
        let batch = dispatch(&command, workers);

        prop_assert_eq!(batch.resources.len(), items.len());
        for (i, resource) in batch.resources.iter().enumerate() {
            prop_assert_eq!(resource.index(), i);
            prop_assert!(resource.result().is_some() != resource.err().is_some());
            match resource.result() {
                Some(Payload::Record(record)) => {
                    prop_assert!(!command.failures[i]);
                    prop_assert_eq!(record["Index"].as_u64(), Some(i as u64));
                }
                Some(Payload::Records(_)) => prop_assert!(false, "unexpected list payload"),
                None => prop_assert!(command.failures[i]),
            }
        }
    }

    #[test]
    fn prop_exit_status_matches_failure_count((items, workers) in case()) {
        let command = Scripted {
            delays_ms: vec![0; items.len()],
            failures: items.iter().map(|(_, f)| *f).collect(),
        };
        let batch = dispatch(&command, workers);
        let failed = command.failures.iter().filter(|f| **f).count();
        let expected = if failed == 0 {
            ExitStatus::Success
        } else if failed == items.len() {
            ExitStatus::TotalFailure
        } else {
            ExitStatus::PartialFailure
        };
        prop_assert_eq!(batch.exit_status(), expected);
    }
}
