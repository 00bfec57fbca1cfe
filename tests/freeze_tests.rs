//! Freeze enforcement.
//!
//! A write into a frozen container kills the process, so each faulting case
//! re-runs this test binary filtered to a single child test with
//! `VMVEC_FREEZE_CHILD` set and checks how the child died.

use std::hint::black_box;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus, Stdio};

use vmvec_mem::VmVec;

const CHILD_ENV: &str = "VMVEC_FREEZE_CHILD";
const MIB: usize = 1024 * 1024;

fn in_child() -> bool {
    std::env::var_os(CHILD_ENV).is_some()
}

fn run_child(test_name: &str) -> ExitStatus {
    let exe = std::env::current_exe().expect("test binary path");
    Command::new(exe)
        .args([test_name, "--exact", "--test-threads=1", "--nocapture"])
        .env(CHILD_ENV, "1")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("spawn child test")
}

fn died_of_protection_fault(status: ExitStatus) -> bool {
    matches!(status.signal(), Some(sig) if sig == libc::SIGSEGV || sig == libc::SIGBUS)
}

fn filled(n: u64) -> VmVec<u64> {
    let mut v = VmVec::<u64>::with_bytes(MIB).expect("reserve");
    for i in 0..n {
        v.push(i).expect("push");
    }
    v
}

#[test]
fn child_overwrite_after_freeze() {
    if !in_child() {
        return;
    }
    let mut v = filled(8);
    v.freeze().expect("freeze");
    // SAFETY: slot 0 is live; the write is expected to fault.
    unsafe { v.as_mut_ptr().write_volatile(42) };
}

#[test]
fn child_push_after_freeze() {
    if !in_child() {
        return;
    }
    let mut v = filled(8);
    v.freeze().expect("freeze");
    v.push(42).expect("push");
    assert_eq!(black_box(&v)[8], 42);
}

#[test]
fn child_growth_while_frozen() {
    if !in_child() {
        return;
    }
    let mut v = VmVec::<u64>::with_bytes(MIB).expect("reserve");
    let cap = v.capacity() as u64;
    for i in 0..cap {
        v.push(i).expect("push");
    }
    v.freeze().expect("freeze");
    // Growth commits the new prefix read-only, so the append still faults.
    v.push(cap).expect("push");
    assert_eq!(black_box(&v)[cap as usize], cap);
}

#[test]
fn child_write_after_unfreeze() {
    if !in_child() {
        return;
    }
    let mut v = filled(8);
    v.freeze().expect("freeze");
    v.unfreeze().expect("unfreeze");
    // SAFETY: slot 0 is live and writable again.
    unsafe { v.as_mut_ptr().write_volatile(42) };
    v.push(9).expect("push");
    assert_eq!(black_box(&v)[0], 42);
}

#[test]
fn test_overwrite_after_freeze_faults() {
    if in_child() {
        return;
    }
    let status = run_child("child_overwrite_after_freeze");
    assert!(died_of_protection_fault(status), "child exited with {:?}", status);
}

#[test]
fn test_push_after_freeze_faults() {
    if in_child() {
        return;
    }
    let status = run_child("child_push_after_freeze");
    assert!(died_of_protection_fault(status), "child exited with {:?}", status);
}

#[test]
fn test_growth_keeps_freeze() {
    if in_child() {
        return;
    }
    let status = run_child("child_growth_while_frozen");
    assert!(died_of_protection_fault(status), "child exited with {:?}", status);
}

#[test]
fn test_unfreeze_restores_writes() {
    if in_child() {
        return;
    }
    let status = run_child("child_write_after_unfreeze");
    assert!(status.success(), "child exited with {:?}", status);
}
