use std::fmt::Debug;
use std::io;
use std::path::Path;

/// The input sources `numa-pools` reads from.
///
/// This trait is automatically mocked by mockall in test builds, generating `MockFilesystem`.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Filesystem: Debug + Send + Sync + 'static {
    /// Reads an entire file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Reads standard input to the end as UTF-8 text.
    fn read_stdin(&self) -> io::Result<String>;
}
