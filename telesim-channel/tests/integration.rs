//! Testes estatísticos do canal

use std::sync::Arc;

use telesim_channel::Channel;
use telesim_core::prelude::*;

const FAST: f64 = 1_000_000.0;

fn encrypted(bits: usize) -> Arc<Message> {
    let msg = Arc::new(Message::new("x"));
    msg.advance_with(MessageState::Encrypted, |f| {
        f.encrypted = Some("01".repeat(bits / 2));
    })
    .unwrap();
    msg
}

#[test]
fn test_zero_probability_never_errs() {
    // Noisy tem piso 0.01; p = 0 exato só no Ideal
    let channel = Channel::with_seed(ChannelProfile::new(ChannelType::Ideal, 0.0, FAST), 7);
    for _ in 0..50 {
        channel.transmit(&encrypted(256)).unwrap();
    }
    assert_eq!(channel.bits_transmitted(), 50 * 256);
    assert_eq!(channel.bit_errors(), 0);
}

#[test]
fn test_ber_converges_to_probability() {
    let p = 0.05;
    let n: u64 = 100_000;
    let channel = Channel::with_seed(ChannelProfile::new(ChannelType::Noisy, p, FAST), 2026);
    channel.transmit(&encrypted(n as usize)).unwrap();

    let errors = channel.bit_errors() as f64;
    let mean = p * n as f64;
    let sigma = (n as f64 * p * (1.0 - p)).sqrt();
    assert!(
        (errors - mean).abs() < 5.0 * sigma,
        "errors={errors} expected≈{mean}±{sigma}"
    );
    assert!((channel.ber() - p * 100.0).abs() < 0.5);
}

#[test]
fn test_errors_are_per_bit_not_per_message() {
    // Com p = 0.5 e 64 bits, erro "por mensagem" daria 0 ou 64 flips
    let channel = Channel::with_seed(ChannelProfile::new(ChannelType::Lossy, 0.5, FAST), 11);
    let mut partial = 0;
    for _ in 0..20 {
        let before = channel.bit_errors();
        channel.transmit(&encrypted(64)).unwrap();
        let flips = channel.bit_errors() - before;
        if flips > 0 && flips < 64 {
            partial += 1;
        }
    }
    assert_eq!(partial, 20);
}

#[test]
fn test_same_seed_same_corruption() {
    let profile = ChannelProfile::new(ChannelType::Intermittent, 0.2, FAST);
    let a = Channel::with_seed(profile, 99);
    let b = Channel::with_seed(profile, 99);
    let ma = encrypted(512);
    let mb = encrypted(512);
    a.transmit(&ma).unwrap();
    b.transmit(&mb).unwrap();
    assert_eq!(ma.encrypted(), mb.encrypted());
}

#[test]
fn test_pacing_respects_rate() {
    let channel = Channel::with_seed(ChannelProfile::new(ChannelType::Ideal, 0.0, 1000.0), 1);
    let start = std::time::Instant::now();
    channel.transmit(&encrypted(20)).unwrap();
    // 20 bits a 1000 bit/s ≥ 20 ms
    assert!(start.elapsed() >= std::time::Duration::from_millis(20));
}
