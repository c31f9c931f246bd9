//! Rendering is pure: repeatable, and JSON output decodes back to the results

use crate::property::support::{dispatch, Scripted};
use proptest::prelude::*;
use rack::render::{render, OutputFormat, RenderOptions};
use serde_json::Value;

const KEYS: &[&str] = &["Name", "Index"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_render_is_repeatable(failures in prop::collection::vec(any::<bool>(), 0..10), header in any::<bool>()) {
        let command = Scripted { delays_ms: vec![0; failures.len()], failures };
        let batch = dispatch(&command, 3);
        let options = RenderOptions { header, ..RenderOptions::default() };
        let first = render(&batch.resources, KEYS, &options).unwrap();
        let second = render(&batch.resources, KEYS, &options).unwrap();
        prop_assert_eq!(&first, &second);

        let ok = command.failures.iter().filter(|f| !**f).count();
        let expected_lines = if ok == 0 { 0 } else { ok + usize::from(header) };
        prop_assert_eq!(first.stdout.lines().count(), expected_lines);
        prop_assert_eq!(first.stderr.len(), command.failures.len() - ok);
    }

    #[test]
    fn prop_json_output_decodes_to_one_entry_per_item(failures in prop::collection::vec(any::<bool>(), 2..10)) {
        let command = Scripted { delays_ms: vec![0; failures.len()], failures };
        let batch = dispatch(&command, 4);
        let options = RenderOptions { format: OutputFormat::Json, ..RenderOptions::default() };
        let out = render(&batch.resources, KEYS, &options).unwrap();
        let decoded: Value = serde_json::from_str(&out.stdout).unwrap();
        let entries = decoded.as_array().unwrap();
        prop_assert_eq!(entries.len(), command.failures.len());
        for (i, entry) in entries.iter().enumerate() {
            if command.failures[i] {
                let expected = format!("item-{}", i);
                prop_assert_eq!(entry["input"].as_str(), Some(expected.as_str()));
            } else {
                prop_assert_eq!(entry["Index"].as_u64(), Some(i as u64));
            }
        }
    }

    #[test]
    fn prop_projection_emits_one_line_per_success(failures in prop::collection::vec(any::<bool>(), 0..10)) {
        let command = Scripted { delays_ms: vec![0; failures.len()], failures };
        let batch = dispatch(&command, 2);
        let options = RenderOptions { fields: vec!["index".to_string()], ..RenderOptions::default() };
        let out = render(&batch.resources, KEYS, &options).unwrap();
        let expected: String = command
            .failures
            .iter()
            .enumerate()
            .filter(|(_, failed)| !**failed)
            .map(|(i, _)| format!("{}\n", i))
            .collect();
        prop_assert_eq!(out.stdout, expected);
    }
}
