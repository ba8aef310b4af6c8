use crate::jvm::Serialize;
use byteorder::WriteBytesExt;

/// Class file version
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.1-200-B.2
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major_version: u16,
    pub minor_version: u16,
}

impl Version {
    pub const JAVA8: Version = Version::new(52);
    pub const JAVA11: Version = Version::new(55);
    pub const JAVA17: Version = Version::new(61);
    pub const JAVA21: Version = Version::new(65);

    pub const fn new(major_version: u16) -> Version {
        Version {
            major_version,
            minor_version: 0,
        }
    }

    /// Whether the version has dynamic constants, nest mates, and the like
    pub fn supports_dynamic_constants(&self) -> bool {
        self.major_version >= 55
    }
}

impl Serialize for Version {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.minor_version.serialize(writer)?;
        self.major_version.serialize(writer)?;
        Ok(())
    }
}
