//! Instruction banner shown by the front-ends

use crate::controller::InvalidKeyPolicy;

pub const WELCOME: &str = "Welcome to reader-writer concurrency demo.";

/// The four properties the operator is invited to check
pub const ASSERTIONS: [&str; 4] = [
    "Assertion 1: No writer can start writing while a reader is reading. \
     To verify this first start a reader (r) and then try to start a writer (w).",
    "Assertion 2: No writer can start writing while another writer is writing. \
     To verify this first start a writer (w) and then try to start another writer (w).",
    "Assertion 3: No reader can start reading while a writer is writing. \
     To verify this first start a writer (w) and then try to start another reader (r).",
    "Assertion 4: Multiple readers can read concurrently at the same time provided no writer is writing. \
     To verify this first start a reader (r) and then try to start another reader (r).",
];

/// Key bindings, one line each
pub fn key_help(policy: InvalidKeyPolicy) -> Vec<String> {
    let other = match policy {
        InvalidKeyPolicy::Exit => "any other key will exit the program",
        InvalidKeyPolicy::Ignore => "any other key is ignored (Esc or Ctrl+C exits)",
    };
    vec![
        "r will start a reader".to_string(),
        "w will start a writer".to_string(),
        "x will exit a reader".to_string(),
        "q will exit a writer".to_string(),
        other.to_string(),
    ]
}

/// Full banner as printed by `rwdemo banner`
pub fn banner(policy: InvalidKeyPolicy) -> Vec<String> {
    let mut lines = vec![
        WELCOME.to_string(),
        String::new(),
        "Instructions: Press one of the following keys:".to_string(),
    ];
    lines.extend(key_help(policy));
    lines.push(String::new());
    lines.push(
        "The only difference between a reader and writer is that a reader acquires a lock in shared mode (S) \
         whereas a writer acquires a lock in exclusive mode (X)"
            .to_string(),
    );
    lines.push("Your objective is to verify following assertions:".to_string());
    lines.extend(ASSERTIONS.iter().map(|s| s.to_string()));
    lines
}
