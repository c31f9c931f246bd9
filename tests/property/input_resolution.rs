//! Plain-text and JSON input decode to the same items

use proptest::prelude::*;
use rack::input::{resolve, InputItem, InputMode, PipeItem};
use serde_json::json;
use std::io::Cursor;

fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z][a-z0-9-]{0,12}", 0..10)
}

fn field_values(mode: &InputMode, input: String) -> Vec<String> {
    resolve(mode, Cursor::new(input.into_bytes()))
        .map(|item| match item.unwrap() {
            InputItem::Pipe(pipe) => pipe.field("name").unwrap(),
            InputItem::Flags => unreachable!("piped mode yielded flags"),
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_text_lines_ignore_blanks_and_padding(names in names(), blanks in prop::collection::vec(any::<bool>(), 10)) {
        let mut input = String::new();
        for (i, name) in names.iter().enumerate() {
            if blanks[i] {
                input.push_str("   \n");
            }
            input.push_str(&format!("  {}\t\n", name));
        }
        let mode = InputMode::from_selector(Some("name"));
        prop_assert_eq!(field_values(&mode, input), names);
    }

    #[test]
    fn prop_json_array_and_stream_agree(names in names()) {
        let records: Vec<_> = names.iter().map(|n| json!({"name": n})).collect();
        let array = serde_json::to_string(&records).unwrap();
        let stream: String = records.iter().map(|r| format!("{}\n", r)).collect();
        let mode = InputMode::from_selector(Some("json"));
        prop_assert_eq!(field_values(&mode, array), names.clone());
        prop_assert_eq!(field_values(&mode, stream), names);
    }

    #[test]
    fn prop_text_items_carry_the_selected_field(name in "[a-z]{1,8}") {
        let mode = InputMode::from_selector(Some("name"));
        let items: Vec<_> = resolve(&mode, Cursor::new(format!("{}\n", name).into_bytes())).collect();
        prop_assert_eq!(items.len(), 1);
        let expected = InputItem::Pipe(PipeItem::Text { field: "name".to_string(), value: name });
        prop_assert_eq!(items.into_iter().next().unwrap().unwrap(), expected);
    }
}
