//! Tag head micro-grammar.
//!
//! A tagged line starts with `<name` followed by any number of shorthand or
//! standard attributes and an optional `>`; whatever follows the `>` is the
//! line's trailing inline text.
//!
//! | prefix | meaning      | repeats                         |
//! |--------|--------------|---------------------------------|
//! | `#`    | id           | same value ignored, other fatal |
//! | `.`    | class        | accumulated                     |
//! | `@`    | src          | same value ignored, other fatal |
//! | `-`    | href         | same value ignored, other fatal |
//! | `:`    | bucket       | first wins                      |
//! | `=`    | bullet label | first wins                      |

/// Parsed tag head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSpec {
    pub name: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub src: Option<String>,
    pub href: Option<String>,
    pub bucket: Option<String>,
    pub number: Option<String>,
    /// Standard attributes other than id/class/src/href.
    pub attrs: Vec<(String, String)>,
    /// Inline text after the closing `>`.
    pub rest: String,
}

/// A malformed tag head. `offset` is the character offset of the problem
/// within the parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagError {
    pub message: String,
    pub offset: usize,
}

impl TagError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Shorthand {
    Id,
    Class,
    Src,
    Href,
    Bucket,
    Number,
}

impl Shorthand {
    fn from_prefix(c: char) -> Option<Self> {
        match c {
            '#' => Some(Shorthand::Id),
            '.' => Some(Shorthand::Class),
            '@' => Some(Shorthand::Src),
            '-' => Some(Shorthand::Href),
            ':' => Some(Shorthand::Bucket),
            '=' => Some(Shorthand::Number),
            _ => None,
        }
    }
}

/// The tag name at the start of `text`, if `text` opens with `<` followed by
/// a letter.
pub fn tag_name(text: &str) -> Option<&str> {
    let after = text.strip_prefix('<')?;
    if !after.chars().next()?.is_alphabetic() {
        return None;
    }
    let end = after.find(|c: char| !is_name_char(c)).unwrap_or(after.len());
    Some(&after[..end])
}

/// Split `text` after the first `>` that is not inside a quoted value.
/// Without a closing `>` the head is the first line.
pub fn split_head(text: &str) -> (&str, &str) {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        if c == '\n' {
            return text.split_at(i);
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return text.split_at(i + 1),
            None => {}
        }
    }
    (text, "")
}

/// Parse a tag head. `input` must start with `<`.
pub fn parse_tag(input: &str) -> Result<TagSpec, TagError> {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();

    if len == 0 || chars[0] != '<' {
        return Err(TagError::new("tag must start with '<'", 0));
    }

    // Scan tag name.
    let mut pos = 1;
    while pos < len && is_name_char(chars[pos]) {
        pos += 1;
    }
    if pos == 1 {
        return Err(TagError::new("missing tag name", 1));
    }
    if !chars[1].is_alphabetic() {
        return Err(TagError::new("tag name must start with a letter", 1));
    }
    if pos < len && !chars[pos].is_whitespace() && chars[pos] != '>' {
        return Err(TagError::new(
            format!("unexpected character '{}' in tag name", chars[pos]),
            pos,
        ));
    }

    let mut spec = TagSpec {
        name: chars[1..pos].iter().collect(),
        ..TagSpec::default()
    };

    loop {
        while pos < len && chars[pos].is_whitespace() && chars[pos] != '\n' {
            pos += 1;
        }
        if pos >= len {
            // No `>`: the head runs to the end and there is no trailing text.
            break;
        }

        let c = chars[pos];
        if c == '>' || c == '\n' {
            // Without a `>`, the head ends with its line.
            let rest: String = chars[pos + 1..].iter().collect();
            spec.rest = rest.trim().to_string();
            break;
        }

        if let Some(kind) = Shorthand::from_prefix(c) {
            let token_start = pos;
            pos += 1;
            let value = read_word(&chars, &mut pos)?;
            if value.is_empty() {
                return Err(TagError::new(
                    format!("shorthand '{c}' needs a value"),
                    token_start,
                ));
            }
            spec.apply_shorthand(kind, value, token_start)?;
            continue;
        }

        if c == '"' || c == '\'' {
            return Err(TagError::new("quoted value without an attribute name", pos));
        }

        // Standard attribute: key, key=value, key="value", key='value'.
        let key_start = pos;
        while pos < len && is_key_char(chars[pos]) {
            pos += 1;
        }
        if pos == key_start {
            return Err(TagError::new(
                format!("unexpected character '{}'", chars[pos]),
                pos,
            ));
        }
        let key: String = chars[key_start..pos].iter().collect();

        let value = if pos < len && chars[pos] == '=' {
            pos += 1;
            if pos >= len || chars[pos].is_whitespace() || chars[pos] == '>' {
                return Err(TagError::new(
                    format!("missing value after '=' for '{key}'"),
                    pos,
                ));
            }
            read_word(&chars, &mut pos)?
        } else {
            String::new()
        };
        spec.apply_attr(key, value, key_start)?;
    }

    Ok(spec)
}

/// Read a quoted or bare word starting at `pos`. Bare words end at
/// whitespace or an unquoted `>`.
fn read_word(chars: &[char], pos: &mut usize) -> Result<String, TagError> {
    let len = chars.len();
    if *pos < len && (chars[*pos] == '"' || chars[*pos] == '\'') {
        let quote = chars[*pos];
        let start = *pos;
        *pos += 1;
        let value_start = *pos;
        while *pos < len && chars[*pos] != quote && chars[*pos] != '\n' {
            *pos += 1;
        }
        if *pos >= len || chars[*pos] == '\n' {
            return Err(TagError::new("unterminated quoted value", start));
        }
        let value = chars[value_start..*pos].iter().collect();
        *pos += 1; // closing quote
        return Ok(value);
    }

    let start = *pos;
    while *pos < len && !chars[*pos].is_whitespace() && chars[*pos] != '>' {
        *pos += 1;
    }
    Ok(chars[start..*pos].iter().collect())
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

fn set_single(
    slot: &mut Option<String>,
    value: String,
    what: &str,
    offset: usize,
) -> Result<(), TagError> {
    match slot {
        None => {
            *slot = Some(value);
            Ok(())
        }
        Some(existing) if *existing == value => Ok(()),
        Some(existing) => Err(TagError::new(
            format!("conflicting {what} '{existing}' and '{value}'"),
            offset,
        )),
    }
}

impl TagSpec {
    fn apply_shorthand(
        &mut self,
        kind: Shorthand,
        value: String,
        offset: usize,
    ) -> Result<(), TagError> {
        match kind {
            Shorthand::Id => set_single(&mut self.id, value, "id", offset),
            Shorthand::Src => set_single(&mut self.src, value, "src", offset),
            Shorthand::Href => set_single(&mut self.href, value, "href", offset),
            Shorthand::Class => {
                self.classes.push(value);
                Ok(())
            }
            Shorthand::Bucket => {
                self.bucket.get_or_insert(value);
                Ok(())
            }
            Shorthand::Number => {
                self.number.get_or_insert(value);
                Ok(())
            }
        }
    }

    fn apply_attr(&mut self, key: String, value: String, offset: usize) -> Result<(), TagError> {
        match key.as_str() {
            "id" => set_single(&mut self.id, value, "id", offset),
            "src" => set_single(&mut self.src, value, "src", offset),
            "href" => set_single(&mut self.href, value, "href", offset),
            "class" => {
                self.classes
                    .extend(value.split_whitespace().map(str::to_string));
                Ok(())
            }
            _ => {
                if !self.attrs.iter().any(|(k, _)| *k == key) {
                    self.attrs.push((key, value));
                }
                Ok(())
            }
        }
    }

    /// Space-joined class list, if any.
    pub fn class(&self) -> Option<String> {
        if self.classes.is_empty() {
            None
        } else {
            Some(self.classes.join(" "))
        }
    }

    /// Serialize back to shorthand form. Fails for a value that holds
    /// both quote characters and cannot be written as a bare word.
    pub fn to_markup(&self) -> Result<String, TagError> {
        let mut out = format!("<{}", self.name);
        let mut push = |prefix: &str, value: &str| -> Result<(), TagError> {
            let word = quoted_form(value)
                .ok_or_else(|| TagError::new(format!("value '{value}' cannot be quoted"), 0))?;
            out.push(' ');
            out.push_str(prefix);
            out.push_str(&word);
            Ok(())
        };
        if let Some(id) = &self.id {
            push("#", id)?;
        }
        for class in &self.classes {
            push(".", class)?;
        }
        if let Some(src) = &self.src {
            push("@", src)?;
        }
        if let Some(href) = &self.href {
            push("-", href)?;
        }
        if let Some(bucket) = &self.bucket {
            push(":", bucket)?;
        }
        if let Some(number) = &self.number {
            push("=", number)?;
        }
        for (key, value) in &self.attrs {
            push(&format!("{key}="), value)?;
        }
        out.push('>');
        out.push_str(&self.rest);
        Ok(out)
    }
}

/// `value` as a word `read_word` reads back unchanged: bare when
/// possible, else in whichever quote it does not contain.
fn quoted_form(value: &str) -> Option<String> {
    let bare = !value.is_empty()
        && !value.starts_with(['"', '\''])
        && !value.chars().any(|c| c.is_whitespace() || c == '>');
    if bare {
        Some(value.to_string())
    } else if value.contains('\n') {
        None
    } else if !value.contains('"') {
        Some(format!("\"{value}\""))
    } else if !value.contains('\'') {
        Some(format!("'{value}'"))
    } else {
        None
    }
}

/// Quote `value` when it could not be read back as a bare word. Double
/// quotes are dropped from a value that needs quoting and holds both kinds.
pub fn quote_word(value: &str) -> String {
    quoted_form(value).unwrap_or_else(|| {
        let cleaned: String = value.chars().filter(|&c| c != '"').collect();
        quoted_form(&cleaned.replace('\n', " ")).unwrap_or_default()
    })
}
