use super::*;

#[test]
fn test_initial_uris_defaults_to_blank_tab() {
    assert_eq!(initial_uris(&[]), vec!["about:blank".to_string()]);
    assert_eq!(initial_uris(&["  ".to_string()]), vec!["about:blank".to_string()]);
}

#[test]
fn test_initial_uris_keeps_order_and_trims() {
    let urls = vec![
        " https://a.example ".to_string(),
        String::new(),
        "https://b.example".to_string(),
    ];
    assert_eq!(
        initial_uris(&urls),
        vec!["https://a.example".to_string(), "https://b.example".to_string()]
    );
}
