use super::*;

#[test]
fn builders_pick_matching_variant() {
    assert!(matches!(
        VignetteError::not_found("a.png"),
        VignetteError::NotFound(_)
    ));
    assert!(matches!(
        VignetteError::pool_corruption("double release"),
        VignetteError::PoolCorruption(_)
    ));
    assert!(matches!(
        VignetteError::invalid_state("open twice"),
        VignetteError::InvalidState(_)
    ));
}

#[test]
fn display_includes_category_and_message() {
    let e = VignetteError::invalid_size("width must be > 0");
    assert_eq!(e.to_string(), "invalid size: width must be > 0");
}

#[test]
fn anyhow_errors_convert_into_other() {
    let e: VignetteError = anyhow::anyhow!("disk on fire").into();
    assert!(matches!(e, VignetteError::Other(_)));
    assert_eq!(e.to_string(), "disk on fire");
}
