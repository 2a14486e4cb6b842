use std::fmt;

use num_derive::FromPrimitive;

// PARADIGM
// ================================================================================================

/// Parallel-programming model a definition or event belongs to.
///
/// The set is closed; trace producers map their measurement system onto one of
/// these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive)]
#[repr(u8)]
pub enum Paradigm {
    Unknown,
    User,
    Compiler,
    OpenMp,
    Mpi,
    Cuda,
    Measurement,
    Pthread,
    Hmpp,
    Ompss,
    Hardware,
    Gaspi,
    Upc,
    Shmem,
    WinThread,
    QtThread,
    AceThread,
    TbbThread,
    OpenAcc,
    OpenCl,
    Mtapi,
    Sampling,
    None,
}

impl fmt::Display for Paradigm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Paradigm::Unknown => "unknown",
            Paradigm::User => "user",
            Paradigm::Compiler => "compiler",
            Paradigm::OpenMp => "openmp",
            Paradigm::Mpi => "mpi",
            Paradigm::Cuda => "cuda",
            Paradigm::Measurement => "measurement",
            Paradigm::Pthread => "pthread",
            Paradigm::Hmpp => "hmpp",
            Paradigm::Ompss => "ompss",
            Paradigm::Hardware => "hardware",
            Paradigm::Gaspi => "gaspi",
            Paradigm::Upc => "upc",
            Paradigm::Shmem => "shmem",
            Paradigm::WinThread => "winthread",
            Paradigm::QtThread => "qtthread",
            Paradigm::AceThread => "acethread",
            Paradigm::TbbThread => "tbbthread",
            Paradigm::OpenAcc => "openacc",
            Paradigm::OpenCl => "opencl",
            Paradigm::Mtapi => "mtapi",
            Paradigm::Sampling => "sampling",
            Paradigm::None => "none",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use num_traits::FromPrimitive;

    use super::*;

    #[test]
    fn display_uses_lowercase_names() {
        assert_eq!(Paradigm::Mpi.to_string(), "mpi");
        assert_eq!(Paradigm::OpenMp.to_string(), "openmp");
        assert_eq!(Paradigm::None.to_string(), "none");
    }

    #[test]
    fn decodes_from_wire_byte() {
        assert_eq!(Paradigm::from_u8(4), Some(Paradigm::Mpi));
        assert_eq!(Paradigm::from_u8(22), Some(Paradigm::None));
        assert_eq!(Paradigm::from_u8(23), None);
    }
}
