//! On-disk VM fixtures.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// A well-formed 32-byte CB58 VM id.
pub const VM_ID: &str = "tGas3T58KzdjLHhBDMnH2TvrddhqTji5iZAMZ3RXs2NLpSnhH";

/// A 36-byte CB58 string whose checksum does not match.
pub const BAD_CHECKSUM_ID: &str = "29uVeLPJB1eQJkzRemU8g8wZDw5uJRqpab5U2mX9euieVwiEbM";

/// A VM module and genesis file in a temporary directory.
pub struct VmFiles {
    pub dir: TempDir,
    pub module: PathBuf,
    pub genesis: PathBuf,
}

impl VmFiles {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let module = dir.path().join("timestampvm");
        let genesis = dir.path().join("genesis.json");
        fs::write(&module, b"\x7fELF").expect("write module");
        fs::write(&genesis, br#"{"data":"hello"}"#).expect("write genesis");
        Self {
            dir,
            module,
            genesis,
        }
    }

    /// Positional arguments selecting this VM.
    pub fn args(&self) -> Vec<String> {
        vec![
            self.module.display().to_string(),
            self.genesis.display().to_string(),
            VM_ID.to_string(),
        ]
    }
}
