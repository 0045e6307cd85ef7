use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identity of an installed livery: the aircraft it belongs to plus its file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LiveryKey {
    pub airplane: String,
    pub file_name: String,
}

impl LiveryKey {
    pub fn new(airplane: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            airplane: airplane.into(),
            file_name: file_name.into(),
        }
    }
}

impl fmt::Display for LiveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.airplane, self.file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Livery {
    pub airplane: String,
    pub file_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Folder the livery was installed to. `None` is a valid state: the
    /// livery is known but its location on disk is not.
    #[serde(default)]
    pub install_location: Option<PathBuf>,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub check_sum: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub small_image: Option<String>,
}

impl Livery {
    pub fn key(&self) -> LiveryKey {
        LiveryKey::new(self.airplane.clone(), self.file_name.clone())
    }

    /// Composite-key comparison. Two liveries with different metadata but the
    /// same aircraft and file name are the same livery.
    pub fn same_livery(&self, other: &Livery) -> bool {
        self.airplane == other.airplane && self.file_name == other.file_name
    }

    pub fn matches_key(&self, key: &LiveryKey) -> bool {
        self.airplane == key.airplane && self.file_name == key.file_name
    }

    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.file_name)
    }
}

/// Position of `livery` in `list` by composite key.
pub fn index_of_livery(livery: &Livery, list: &[Livery]) -> Option<usize> {
    list.iter().position(|l| l.same_livery(livery))
}

/// Catalogue entry as published in the remote file listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedFile {
    pub airplane: String,
    pub file_name: String,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub check_sum: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub small_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingData {
    pub cdn_base_url: String,
    #[serde(default)]
    pub file_list: Vec<ListedFile>,
}

/// Remote livery catalogue together with the time it was fetched
/// (milliseconds since the Unix epoch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListing {
    pub checked_at: i64,
    pub data: ListingData,
}

impl FileListing {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn thumbnail_url(&self, airplane: &str) -> String {
        format!("{}/img/{}/thumbnail.JPG", self.data.cdn_base_url, airplane)
    }

    pub fn find(&self, key: &LiveryKey) -> Option<&ListedFile> {
        self.data
            .file_list
            .iter()
            .find(|f| f.airplane == key.airplane && f.file_name == key.file_name)
    }

    /// Installed liveries whose listed checksum differs from the installed one.
    /// Liveries that are not in the listing at all are not considered outdated.
    pub fn outdated<'a>(&self, installed: &'a [Livery]) -> Vec<&'a Livery> {
        installed
            .iter()
            .filter(|l| {
                self.find(&l.key())
                    .is_some_and(|f| !f.check_sum.is_empty() && f.check_sum != l.check_sum)
            })
            .collect()
    }
}

/// Bundled fallback shown when an aircraft has no thumbnail on the CDN.
pub const NO_IMAGE: &str = "no-image-available.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AircraftGroup {
    pub name: String,
    pub thumbnails: Vec<String>,
    pub livery_count: usize,
}

/// Groups installed liveries by aircraft, in first-seen order.
///
/// Group names are lower-cased. Thumbnails list the CDN image first (when a
/// listing is available) followed by [`NO_IMAGE`].
pub fn group_by_aircraft(
    installed: &[Livery],
    listing: Option<&FileListing>,
) -> Vec<AircraftGroup> {
    let mut groups: Vec<AircraftGroup> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for livery in installed {
        if let Some(i) = seen.iter().position(|a| *a == livery.airplane) {
            groups[i].livery_count += 1;
            continue;
        }
        seen.push(&livery.airplane);

        let mut thumbnails = Vec::new();
        if let Some(listing) = listing {
            thumbnails.push(listing.thumbnail_url(&livery.airplane));
        }
        thumbnails.push(NO_IMAGE.to_string());

        groups.push(AircraftGroup {
            name: livery.airplane.to_lowercase(),
            thumbnails,
            livery_count: 1,
        });
    }

    groups
}
