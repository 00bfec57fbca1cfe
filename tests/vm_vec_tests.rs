//! Container behavior: growth, stability, erase, ceilings.

use std::rc::Rc;

use vmvec_core::config::VecConfig;
use vmvec_core::Error;
use vmvec_mem::{page_size, CloneErase, EraseStrategy, MoveErase, RelocateErase, VmVec};

const MIB: usize = 1024 * 1024;
const GIB: usize = 1024 * MIB;

/// Capacity after each commit for `count` appends, following the 3/2 ratio
/// and clamping the last step to the reservation.
fn expected_capacities(c0: usize, max: usize, count: usize) -> Vec<usize> {
    let mut caps = vec![c0];
    let mut cap = c0;
    while cap < count && cap < max {
        cap = (cap * 3 / 2).max(cap + 1).min(max);
        caps.push(cap);
    }
    caps
}

#[test]
fn test_pointer_stability_across_growth() {
    let mut v = VmVec::<u64>::with_bytes(GIB).unwrap();
    let mut addrs = Vec::new();

    for i in 0..200_000u64 {
        v.push(i).unwrap();
        if i % 997 == 0 {
            addrs.push((i as usize, &v[i as usize] as *const u64));
        }
    }
    assert!(v.growth_stats().growth_events > 5);

    for (k, addr) in addrs {
        assert_eq!(&v[k] as *const u64, addr, "element {} moved", k);
        assert_eq!(v[k], k as u64);
    }
}

#[test]
fn test_capacity_follows_growth_ratio() {
    let mut v = VmVec::<u64>::with_bytes(GIB).unwrap();
    let c0 = page_size() / 8;
    assert_eq!(v.capacity(), c0);

    let mut observed = vec![v.capacity()];
    let mut value = 0u64;
    for _ in 0..10 {
        while v.len() < v.capacity() {
            v.push(value).unwrap();
            value += 1;
        }
        v.push(value).unwrap();
        value += 1;
        observed.push(v.capacity());
    }

    assert_eq!(v.growth_stats().growth_events, 10);
    for (n, &cap) in observed.iter().enumerate() {
        let ideal = (c0 as f64 * 1.5f64.powi(n as i32)).floor() as usize;
        // Flooring can only lose elements against the ideal curve.
        assert!(cap <= ideal && ideal - cap <= n, "step {}: {} vs {}", n, cap, ideal);
        assert!(cap <= v.max_capacity());
    }
}

#[test]
fn test_contents_match_pushes() {
    let mut v = VmVec::<i32>::with_elements(100_000).unwrap();
    let values: Vec<i32> = (0..50_000).map(|i| i * 7 - 3).collect();
    for &x in &values {
        v.push(x).unwrap();
    }
    assert_eq!(v.len(), values.len());
    assert_eq!(v.as_slice(), values.as_slice());
    assert!(v.iter().copied().eq(values.iter().copied()));
}

#[test]
fn test_erase_preserves_order_and_drops_once() {
    let tokens: Vec<Rc<()>> = (0..8).map(|_| Rc::new(())).collect();
    let mut v = VmVec::<Rc<()>>::with_bytes(MIB).unwrap();
    for t in &tokens {
        v.push(Rc::clone(t)).unwrap();
    }

    v.erase(2, 5).unwrap();
    assert_eq!(v.len(), 5);
    for (i, t) in tokens.iter().enumerate() {
        let expected = if (2..5).contains(&i) { 1 } else { 2 };
        assert_eq!(Rc::strong_count(t), expected, "token {}", i);
    }
    let kept: Vec<usize> = [0, 1, 5, 6, 7].to_vec();
    for (slot, &orig) in kept.iter().enumerate() {
        assert!(Rc::ptr_eq(&v[slot], &tokens[orig]));
    }

    drop(v);
    assert!(tokens.iter().all(|t| Rc::strong_count(t) == 1));
}

#[test]
fn test_every_strategy_gives_the_same_result() {
    let cfg = VecConfig::with_bytes(MIB);
    let words: Vec<String> = (0..20).map(|i| format!("w{}", i)).collect();

    let mut relocated = VmVec::<String, RelocateErase>::with_policy(&cfg).unwrap();
    let mut moved = VmVec::<String, MoveErase>::with_policy(&cfg).unwrap();
    let mut cloned = VmVec::<String, CloneErase>::with_policy(&cfg).unwrap();
    relocated.extend_from_slice(&words).unwrap();
    moved.extend_from_slice(&words).unwrap();
    cloned.extend_from_slice(&words).unwrap();

    for (first, last) in [(3, 9), (0, 1), (9, 12), (0, 0)] {
        relocated.erase(first, last).unwrap();
        moved.erase(first, last).unwrap();
        cloned.erase(first, last).unwrap();
    }

    assert_eq!(relocated.len(), 10);
    assert_eq!(relocated.as_slice(), moved.as_slice());
    assert_eq!(moved.as_slice(), cloned.as_slice());
    assert_eq!(relocated.erase_strategy(), EraseStrategy::Relocate);
    assert_eq!(moved.erase_strategy(), EraseStrategy::MoveAssign);
    assert_eq!(cloned.erase_strategy(), EraseStrategy::CloneAssign);
}

#[test]
fn test_growth_ceiling_is_enforced() {
    let mut v = VmVec::<u64>::with_bytes(page_size()).unwrap();
    let max = page_size() / 8;
    assert_eq!(v.max_capacity(), max);
    for i in 0..max as u64 {
        v.push(i).unwrap();
    }

    let err = v.push(0).unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded { mapping_size, .. } if mapping_size == page_size()));
    assert_eq!(v.len(), max);
    assert_eq!(v[max - 1], max as u64 - 1);
}

#[test]
fn test_one_mib_scenario() {
    let mut v = VmVec::<u64>::with_bytes(MIB).unwrap();
    let max = MIB / 8;
    let c0 = page_size() / 8;
    let mut caps = vec![v.capacity()];

    for i in 0..130_073u64 {
        v.push(i).unwrap();
        if v.capacity() != caps[caps.len() - 1] {
            caps.push(v.capacity());
        }
    }

    assert_eq!(v.len(), 130_073);
    assert!(v.capacity() <= max);
    assert_eq!(caps, expected_capacities(c0, max, 130_073));
    assert_eq!(v[130_072], 130_072);
}

#[test]
fn test_custom_growth_ratio() {
    let cfg = VecConfig::with_bytes(64 * MIB).with_growth(2, 1);
    let mut v = VmVec::<u32>::with_config(&cfg).unwrap();
    let c0 = v.capacity();
    for i in 0..(c0 * 4 + 1) as u32 {
        v.push(i).unwrap();
    }
    assert_eq!(v.capacity(), c0 * 8);
    assert_eq!(v.growth_stats().growth_events, 3);
}

#[test]
fn test_clear_then_reuse() {
    let mut v = VmVec::<String>::with_elements(10_000).unwrap();
    for i in 0..5_000 {
        v.push(i.to_string()).unwrap();
    }
    let cap = v.capacity();
    let base = v.as_ptr();
    v.clear();
    assert!(v.is_empty());
    assert_eq!(v.capacity(), cap);

    v.push("again".into()).unwrap();
    assert_eq!(v.as_ptr(), base);
    assert_eq!(v[0], "again");
}

#[test]
fn test_frozen_contents_stay_readable() {
    let mut v = VmVec::<u64>::with_bytes(MIB).unwrap();
    v.extend_from_slice(&[1, 2, 3]).unwrap();
    v.freeze().unwrap();
    assert!(v.is_frozen());
    assert_eq!(v.iter().sum::<u64>(), 6);
    v.unfreeze().unwrap();
    assert!(!v.is_frozen());
    v[1] = 20;
    assert_eq!(v.as_slice(), &[1, 20, 3]);
}

#[test]
fn test_dropping_frozen_vector_destroys_survivors() {
    let token = Rc::new(());
    {
        let mut v = VmVec::<Rc<()>>::with_bytes(MIB).unwrap();
        for _ in 0..100 {
            v.push(Rc::clone(&token)).unwrap();
        }
        v.freeze().unwrap();
        assert_eq!(Rc::strong_count(&token), 101);
    }
    assert_eq!(Rc::strong_count(&token), 1);
}
