use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 127), 64);
    assert_eq!(mul_div255_u8(0, 200), 0);
    assert_eq!(mul_div255_u16(255, 128), 128);
}

#[test]
fn wave_channel_centers_and_clamps() {
    assert_eq!(wave_channel(0.0, 127.0, 128.0), 128);
    assert_eq!(wave_channel(1.0, 127.0, 128.0), 255);
    assert_eq!(wave_channel(-1.0, 127.0, 128.0), 1);
    assert_eq!(wave_channel(0.0, 30.0, 225.0), 225);
    assert_eq!(wave_channel(2.0, 127.0, 128.0), 255);
}
