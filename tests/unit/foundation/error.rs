use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LoopcompError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        LoopcompError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(
        LoopcompError::encode("x")
            .to_string()
            .contains("encode error:")
    );
    assert!(
        LoopcompError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LoopcompError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
