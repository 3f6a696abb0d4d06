pub use scpi_toolchain_diagnostics::{
    Diagnostic, ErrorKind, LineIndex, Severity, Span, codes, explain,
};
