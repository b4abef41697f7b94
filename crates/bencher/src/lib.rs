//! Shared fixtures of the benchmarks.

#[derive(Debug, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    input: String,
}

impl TestCase {
    pub fn new<S: Into<String>>(name: &'static str, group: TestGroup, input: S) -> Self {
        Self { name, group, input: input.into() }
    }

    pub fn small<S: Into<String>>(name: &'static str, input: S) -> Self {
        Self::new(name, TestGroup::Small, input)
    }

    pub fn normal<S: Into<String>>(name: &'static str, input: S) -> Self {
        Self::new(name, TestGroup::Normal, input)
    }

    pub fn large<S: Into<String>>(name: &'static str, input: S) -> Self {
        Self::new(name, TestGroup::Large, input)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn input(&self) -> &str {
        &self.input
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

pub const BOUNDARY: &str = "----BencherFormBoundary";

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// A multipart form with `fields` text fields and one file of `file_size` bytes.
pub fn multipart_form(fields: usize, file_size: usize) -> String {
    let mut form = String::new();
    for i in 0..fields {
        form.push_str(&format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"field{i}\"\r\n\r\nvalue {i}\r\n"));
    }

    form.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"upload\"; filename=\"data.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    ));
    form.extend((0..file_size).map(|i| char::from(ALPHABET[i % ALPHABET.len()])));
    form.push_str(&format!("\r\n--{BOUNDARY}--\r\n"));
    form
}

/// An `X-Forwarded-For` value with `hops` addresses of `10.0.0.0/8`.
pub fn forwarded_chain(hops: usize) -> String {
    let mut chain = vec!["203.0.113.7".to_string()];
    chain.extend((1..hops).map(|i| format!("10.0.{}.{}", i / 256, i % 256)));
    chain.join(", ")
}
