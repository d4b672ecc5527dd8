use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Columns a book row can carry. Header cells are mapped onto these once per read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Isbn,
    Cover,
    Title,
    Authors,
    ReadingLevel,
    Location,
    Publishers,
    Pages,
    Genres,
    Language,
    Notes,
    RequestedBy,
}

impl Field {
    /// Write order of an appended row (columns A..K). `RequestedBy` is never appended.
    pub const ROW_ORDER: [Field; 11] = [
        Field::Isbn,
        Field::Cover,
        Field::Title,
        Field::Authors,
        Field::ReadingLevel,
        Field::Location,
        Field::Publishers,
        Field::Pages,
        Field::Genres,
        Field::Language,
        Field::Notes,
    ];

    /// Fixed 0-indexed column of this field in the inventory layout
    pub fn column(self) -> usize {
        match self {
            Field::Isbn => 0,
            Field::Cover => 1,
            Field::Title => 2,
            Field::Authors => 3,
            Field::ReadingLevel => 4,
            Field::Location => 5,
            Field::Publishers => 6,
            Field::Pages => 7,
            Field::Genres => 8,
            Field::Language => 9,
            Field::Notes => 10,
            Field::RequestedBy => 11,
        }
    }

    /// Map a header cell (`ISBN`, `isbn`, `Reading Level`, `requested_by`, ...) to a field.
    pub fn from_header(header: &str) -> Option<Field> {
        let key: String = header
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        let field = match key.as_str() {
            "isbn" => Field::Isbn,
            "cover" => Field::Cover,
            "title" => Field::Title,
            "author" | "authors" => Field::Authors,
            "readinglevel" | "level" => Field::ReadingLevel,
            "location" => Field::Location,
            "publisher" | "publishers" => Field::Publishers,
            "pages" => Field::Pages,
            "genre" | "genres" => Field::Genres,
            "language" => Field::Language,
            "notes" => Field::Notes,
            "requestedby" | "requester" => Field::RequestedBy,
            _ => return None,
        };
        Some(field)
    }
}

/// One inventory row, keyed by ISBN
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub isbn: String,
    /// Plain URL; the `=IMAGE(...)` wrapper is removed on read
    pub cover: String,
    pub title: String,
    pub authors: String,
    pub reading_level: String,
    pub publishers: String,
    pub pages: String,
    pub genres: String,
    pub language: String,
    pub notes: String,
    pub location: String,
    pub requested_by: String,
}

/// Where a book is, and whether someone asked for it to be moved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookState<'a> {
    Shelved { location: &'a str },
    Requested { location: &'a str, requested_by: &'a str },
}

impl BookRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Isbn => &self.isbn,
            Field::Cover => &self.cover,
            Field::Title => &self.title,
            Field::Authors => &self.authors,
            Field::ReadingLevel => &self.reading_level,
            Field::Location => &self.location,
            Field::Publishers => &self.publishers,
            Field::Pages => &self.pages,
            Field::Genres => &self.genres,
            Field::Language => &self.language,
            Field::Notes => &self.notes,
            Field::RequestedBy => &self.requested_by,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Isbn => &mut self.isbn,
            Field::Cover => &mut self.cover,
            Field::Title => &mut self.title,
            Field::Authors => &mut self.authors,
            Field::ReadingLevel => &mut self.reading_level,
            Field::Location => &mut self.location,
            Field::Publishers => &mut self.publishers,
            Field::Pages => &mut self.pages,
            Field::Genres => &mut self.genres,
            Field::Language => &mut self.language,
            Field::Notes => &mut self.notes,
            Field::RequestedBy => &mut self.requested_by,
        };
        *slot = value;
    }

    pub fn state(&self) -> BookState<'_> {
        if self.requested_by.trim().is_empty() {
            BookState::Shelved {
                location: &self.location,
            }
        } else {
            BookState::Requested {
                location: &self.location,
                requested_by: &self.requested_by,
            }
        }
    }
}

/// Candidate for `add_book`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBook {
    pub isbn: String,
    /// Plain cover URL, may be empty
    pub cover: String,
    pub title: String,
    pub authors: String,
    pub reading_level: String,
    pub location: String,
    pub publishers: String,
    #[serde(deserialize_with = "string_or_number")]
    pub pages: String,
    pub genres: String,
    pub language: String,
    pub notes: String,
}

/// Accept `"312"`, `312` or `null` for free-text columns that clients sometimes send as numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}
