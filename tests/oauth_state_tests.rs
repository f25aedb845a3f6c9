// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! OAuth state encoding/verification tests.
//!
//! These tests verify that the signed state parameter survives the trip
//! through the provider, and that tampered, stale, or unbound states are
//! rejected.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use recipe_share::routes::auth::{sign_state, verify_state};
use std::time::{SystemTime, UNIX_EPOCH};

const KEY: &[u8] = b"test_oauth_state_key_32_bytes!!!";

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis()
}

#[test]
fn test_oauth_state_roundtrip() {
    let now = now_ms();
    let state = sign_state("abc123", now, KEY).unwrap();

    assert_eq!(verify_state(&state, Some("abc123"), now, KEY), Ok(()));
}

#[test]
fn test_oauth_state_base64_url_safe() {
    // Verify we're using URL-safe base64 (no + or /)
    let state = sign_state("abc123", now_ms(), KEY).unwrap();

    assert!(!state.contains('+'), "State should not contain '+'");
    assert!(!state.contains('/'), "State should not contain '/'");
    assert!(!state.contains('='), "State should not contain '=' padding");
}

#[test]
fn test_oauth_state_payload_layout() {
    let state = sign_state("abc123", 0x1234, KEY).unwrap();
    let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(state).unwrap()).unwrap();

    let parts: Vec<&str> = decoded.split('|').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "abc123");
    assert_eq!(parts[1], "1234");
    assert_eq!(parts[2].len(), 64);
}

#[test]
fn test_oauth_state_tampered_nonce() {
    let now = now_ms();
    let state = sign_state("abc123", now, KEY).unwrap();
    let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(state).unwrap()).unwrap();
    let tampered = URL_SAFE_NO_PAD.encode(decoded.replacen("abc123", "xyz789", 1));

    assert_eq!(
        verify_state(&tampered, Some("xyz789"), now, KEY),
        Err("signature mismatch")
    );
}

#[test]
fn test_oauth_state_window() {
    let issued = now_ms();
    let state = sign_state("abc123", issued, KEY).unwrap();

    assert!(verify_state(&state, Some("abc123"), issued + 9 * 60 * 1000, KEY).is_ok());
    assert_eq!(
        verify_state(&state, Some("abc123"), issued + 11 * 60 * 1000, KEY),
        Err("expired")
    );
}

#[test]
fn test_oauth_state_decode_invalid() {
    // Invalid base64
    assert!(verify_state("not-valid-base64!!!", Some("x"), now_ms(), KEY).is_err());

    // Empty state
    assert!(verify_state("", Some(""), now_ms(), KEY).is_err());
}
