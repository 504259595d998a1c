use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use super::error::MappingDbError;

const PLATFORM_TAG: &str = "platform:";

/// 16-byte device identifier as used by SDL mapping files
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; 16]);

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for Guid {
    type Err = MappingDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(MappingDbError::InvalidGuid(s.to_string()));
        }

        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| MappingDbError::InvalidGuid(s.to_string()))?;
        }
        Ok(Guid(bytes))
    }
}

/// Platform name as written in the `platform:` field of mapping lines
pub fn current_platform() -> &'static str {
    if cfg!(target_os = "windows") {
        "Windows"
    } else if cfg!(target_os = "macos") {
        "Mac OS X"
    } else if cfg!(target_os = "android") {
        "Android"
    } else if cfg!(target_os = "ios") {
        "iOS"
    } else {
        "Linux"
    }
}

#[derive(Clone, Debug)]
struct MappingEntry {
    guid: Guid,
    name: String,
    line: String,
}

/// Mappings accepted for one platform, in file order
#[derive(Clone, Debug, Default)]
pub struct MappingDatabase {
    entries: Vec<MappingEntry>,
    by_guid: HashMap<Guid, usize>,
}

impl MappingDatabase {
    /// Reads and parses the database at `path` for the running platform
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MappingDbError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MappingDbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text, current_platform()))
    }

    /// Parses mapping lines, keeping those that apply to `platform`.
    ///
    /// Blank lines and `#` comments are skipped, malformed lines are logged and
    /// skipped. A later line for the same GUID replaces the earlier one.
    pub fn parse(text: &str, platform: &str) -> Self {
        let mut db = Self::default();

        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(',').collect();
            if fields.iter().filter(|f| !f.trim().is_empty()).count() < 3 {
                debug!("Skipping malformed mapping on line {}", line_no + 1);
                continue;
            }

            let guid = match fields[0].parse::<Guid>() {
                Ok(guid) => guid,
                Err(e) => {
                    debug!("Skipping mapping on line {}: {}", line_no + 1, e);
                    continue;
                }
            };

            let tagged_platform = fields
                .iter()
                .find_map(|f| f.trim().strip_prefix(PLATFORM_TAG));
            if let Some(tagged) = tagged_platform {
                if tagged.trim() != platform {
                    continue;
                }
            }

            let entry = MappingEntry {
                guid,
                name: fields[1].trim().to_string(),
                line: line.to_string(),
            };

            match db.by_guid.get(&guid) {
                Some(&index) => {
                    debug!("Mapping for {} on line {} overrides an earlier one", guid, line_no + 1);
                    db.entries[index] = entry;
                }
                None => {
                    db.by_guid.insert(guid, db.entries.len());
                    db.entries.push(entry);
                }
            }
        }

        if db.entries.is_empty() && !text.trim().is_empty() {
            warn!("No mappings in the database apply to platform {}", platform);
        }

        db
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full mapping line for a device GUID
    pub fn lookup(&self, guid: &Guid) -> Option<&str> {
        self.by_guid
            .get(guid)
            .map(|&index| self.entries[index].line.as_str())
    }

    /// Human-readable controller name stored with a mapping
    pub fn name_of(&self, guid: &Guid) -> Option<&str> {
        self.by_guid
            .get(guid)
            .map(|&index| self.entries[index].name.as_str())
    }

    /// Accepted lines joined back into database text
    pub fn as_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
