//! GF(2^8) arithmetic with the primitive polynomial 0x11D, the field
//! conventionally used by Cauchy Reed-Solomon erasure coding
//! implementations (including `longhair`, the C library spec §6's
//! `longhair.k`/`longhair.m` config keys are named after).

const PRIMITIVE_POLY: u16 = 0x11D;

/// Log/antilog tables, built once at first use.
struct Tables {
    exp: [u8; 512],
    log: [u8; 256],
}

fn build_tables() -> Tables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    for i in 0..255usize {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE_POLY;
        }
    }
    for i in 255..512 {
        exp[i] = exp[i - 255];
    }
    Tables { exp, log }
}

fn tables() -> &'static Tables {
    use std::sync::OnceLock;
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(build_tables)
}

/// `a XOR b` is GF(256) addition (and subtraction); no helper needed.
/// Multiply two GF(256) elements.
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = tables();
    let log_sum = t.log[a as usize] as usize + t.log[b as usize] as usize;
    t.exp[log_sum]
}

/// Multiplicative inverse of a nonzero GF(256) element.
///
/// # Panics
///
/// Panics if `a == 0` (zero has no inverse).
pub fn inv(a: u8) -> u8 {
    assert!(a != 0, "zero has no multiplicative inverse in GF(256)");
    let t = tables();
    let log_a = t.log[a as usize] as usize;
    t.exp[255 - log_a]
}

/// Divide `a` by `b` in GF(256).
pub fn div(a: u8, b: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    mul(a, inv(b))
}
