//! Property tests for integer parameter extraction.

use hrr::{ErrorKind, PathParams, RequestPipeline, Settings};
use http::Request;
use proptest::prelude::*;
use std::io::Cursor;

fn extract(raw: &str) -> Result<i64, hrr::RequestError> {
    let settings = Settings::default();
    let mut req = Request::get("/").body(Cursor::new(Vec::new())).unwrap();
    let params: PathParams = [("id", raw)].into_iter().collect();
    let mut id = 0;

    RequestPipeline::new(&mut req, &settings)
        .extract_i64_param(&params, "id", &mut id)
        .process()?;
    Ok(id)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 500,
        ..ProptestConfig::default()
    })]

    /// Property: every i64 survives formatting and extraction.
    #[test]
    fn any_i64_is_extracted(n in any::<i64>()) {
        prop_assert_eq!(extract(&n.to_string()).unwrap(), n);
    }

    /// Property: anything with a non-digit character is rejected by name.
    #[test]
    fn non_numeric_is_rejected(raw in "[0-9]{0,5}[a-zA-Z .][0-9a-z]{0,5}") {
        let err = extract(&raw).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Param);
        prop_assert_eq!(err.message(), "cannot find int64 parameter id");
    }

    /// Property: values beyond the i64 range are rejected.
    #[test]
    fn overflow_is_rejected(extra in 1_u64..1_000_000) {
        let raw = (i128::from(i64::MAX) + i128::from(extra)).to_string();
        prop_assert!(extract(&raw).is_err());
    }
}
