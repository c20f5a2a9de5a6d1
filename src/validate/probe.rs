//! Probe programs compiled during validation.

use serde::{Deserialize, Serialize};

/// Source language of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeLanguage {
    C,
    Cxx,
}

impl ProbeLanguage {
    /// File extension the compiler recognizes.
    pub fn extension(&self) -> &'static str {
        match self {
            ProbeLanguage::C => "c",
            ProbeLanguage::Cxx => "cpp",
        }
    }
}

/// What the compiler is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutput {
    /// A linked executable.
    Executable,
    /// A relocatable object (`-c`).
    Object,
}

/// One probe program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSpec {
    pub name: String,
    pub language: ProbeLanguage,
    pub output: ProbeOutput,
    pub source: String,
    /// Skip instead of failing when the compiler is absent.
    pub optional: bool,
}

impl ProbeSpec {
    /// Compiler arguments after the descriptor's flags.
    pub fn compile_args(&self, source: &str, output: &str) -> Vec<String> {
        let mut args = Vec::new();
        if self.output == ProbeOutput::Object {
            args.push("-c".to_string());
        }
        args.extend(["-o".to_string(), output.to_string(), source.to_string()]);
        args
    }

    /// Name of the file the compiler writes.
    pub fn output_file(&self) -> &'static str {
        match self.output {
            ProbeOutput::Executable => "probe",
            ProbeOutput::Object => "probe.o",
        }
    }
}

const C_HELLO: &str = r#"#include <stdio.h>

int main(void) {
    printf("hello from the cross toolchain\n");
    return 0;
}
"#;

const CXX_HELLO: &str = r#"#include <string>
#include <vector>

int main() {
    std::vector<std::string> words{"hello", "cross", "toolchain"};
    return words.size() == 3 ? 0 : 1;
}
"#;

const C_STATIC_LIB: &str = r#"int crosskit_probe_add(int a, int b) {
    return a + b;
}
"#;

/// The standard probe set, in run order.
pub fn default_probes() -> Vec<ProbeSpec> {
    vec![
        ProbeSpec {
            name: "c-hello".to_string(),
            language: ProbeLanguage::C,
            output: ProbeOutput::Executable,
            source: C_HELLO.to_string(),
            optional: false,
        },
        ProbeSpec {
            name: "cxx-hello".to_string(),
            language: ProbeLanguage::Cxx,
            output: ProbeOutput::Executable,
            source: CXX_HELLO.to_string(),
            optional: true,
        },
        ProbeSpec {
            name: "c-static-lib".to_string(),
            language: ProbeLanguage::C,
            output: ProbeOutput::Object,
            source: C_STATIC_LIB.to_string(),
            optional: false,
        },
    ]
}
