use std::fs;
use std::path::Path;
use chrono::{DateTime, Utc};
use crate::build::progress::Progress;
use crate::core::error::Result;

/// Location, size and modification time of a parsed input file
#[derive(Debug, Clone)]
pub struct InputSource {
    pub path: String,
    pub size: u64,
    pub mtime: DateTime<Utc>,
}

impl InputSource {
    /// Reads the descriptor of a file on disk.
    pub fn from_path(path: &Path) -> Result<InputSource> {
        let stat = fs::metadata(path)?;
        Ok(InputSource {
            path: path.display().to_string(),
            size: stat.len(),
            mtime: DateTime::<Utc>::from(stat.modified()?),
        })
    }
}

/// Receiver side of the parser event protocol. Byte buffers are only
/// valid for the duration of the call; the receiver copies what it keeps.
pub trait EventSink {
    fn open_doc(&mut self, name: &[u8]) -> Result<()>;
    fn close_doc(&mut self) -> Result<()>;
    fn open_elem(
        &mut self,
        name: &[u8],
        atts: &[(Vec<u8>, Vec<u8>)],
        nsps: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<()>;
    fn empty_elem(
        &mut self,
        name: &[u8],
        atts: &[(Vec<u8>, Vec<u8>)],
        nsps: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<()>;
    fn close_elem(&mut self) -> Result<()>;
    fn text(&mut self, value: &[u8]) -> Result<()>;
    fn comment(&mut self, value: &[u8]) -> Result<()>;
    fn pi(&mut self, value: &[u8]) -> Result<()>;
    fn encoding(&mut self, encoding: &str);
}

/// Source driving a build with structural events
pub trait Parser {
    fn parse(&mut self, sink: &mut dyn EventSink) -> Result<()>;

    /// Current input location, used in error messages
    fn detail(&self) -> String {
        String::new()
    }

    /// Descriptor of the parsed input, if it comes from a file
    fn source(&self) -> Option<InputSource> {
        None
    }

    /// Called by the builder so the parser can publish its position.
    fn bind_progress(&mut self, _progress: Progress) {}
}

/// One recorded structural event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OpenDoc { name: Vec<u8> },
    CloseDoc,
    OpenElem { name: Vec<u8>, atts: Vec<(Vec<u8>, Vec<u8>)>, nsps: Vec<(Vec<u8>, Vec<u8>)> },
    EmptyElem { name: Vec<u8>, atts: Vec<(Vec<u8>, Vec<u8>)>, nsps: Vec<(Vec<u8>, Vec<u8>)> },
    CloseElem,
    Text(Vec<u8>),
    Comment(Vec<u8>),
    Pi(Vec<u8>),
}

fn pairs(input: &[(&str, &str)]) -> Vec<(Vec<u8>, Vec<u8>)> {
    input
        .iter()
        .map(|(a, b)| (a.as_bytes().to_vec(), b.as_bytes().to_vec()))
        .collect()
}

impl Event {
    pub fn open_doc(name: &str) -> Event {
        Event::OpenDoc { name: name.as_bytes().to_vec() }
    }

    pub fn open_elem(name: &str) -> Event {
        Event::open_elem_with(name, &[], &[])
    }

    pub fn open_elem_with(name: &str, atts: &[(&str, &str)], nsps: &[(&str, &str)]) -> Event {
        Event::OpenElem {
            name: name.as_bytes().to_vec(),
            atts: pairs(atts),
            nsps: pairs(nsps),
        }
    }

    pub fn empty_elem(name: &str) -> Event {
        Event::empty_elem_with(name, &[], &[])
    }

    pub fn empty_elem_with(name: &str, atts: &[(&str, &str)], nsps: &[(&str, &str)]) -> Event {
        Event::EmptyElem {
            name: name.as_bytes().to_vec(),
            atts: pairs(atts),
            nsps: pairs(nsps),
        }
    }

    pub fn text(value: &str) -> Event {
        Event::Text(value.as_bytes().to_vec())
    }

    pub fn comment(value: &str) -> Event {
        Event::Comment(value.as_bytes().to_vec())
    }

    pub fn pi(value: &str) -> Event {
        Event::Pi(value.as_bytes().to_vec())
    }
}

/// Parser replaying a recorded event stream, used by tests and benches
/// and by the round-trip over an already built database.
pub struct EventParser {
    events: Vec<Event>,
    pos: usize,
    progress: Option<Progress>,
}

impl EventParser {
    pub fn new(events: Vec<Event>) -> Self {
        EventParser {
            events,
            pos: 0,
            progress: None,
        }
    }
}

impl Parser for EventParser {
    fn parse(&mut self, sink: &mut dyn EventSink) -> Result<()> {
        let total = self.events.len();
        for i in 0..total {
            self.pos = i + 1;
            if let Some(progress) = &self.progress {
                progress.set_input(self.pos as f64 / total as f64, None);
            }
            match &self.events[i] {
                Event::OpenDoc { name } => sink.open_doc(name)?,
                Event::CloseDoc => sink.close_doc()?,
                Event::OpenElem { name, atts, nsps } => sink.open_elem(name, atts, nsps)?,
                Event::EmptyElem { name, atts, nsps } => sink.empty_elem(name, atts, nsps)?,
                Event::CloseElem => sink.close_elem()?,
                Event::Text(value) => sink.text(value)?,
                Event::Comment(value) => sink.comment(value)?,
                Event::Pi(value) => sink.pi(value)?,
            }
        }
        Ok(())
    }

    fn detail(&self) -> String {
        format!("event {} of {}", self.pos, self.events.len())
    }

    fn bind_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_source_captures_file_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.xml");
        fs::write(&path, b"<a/>").unwrap();

        let source = InputSource::from_path(&path).unwrap();
        assert_eq!(source.size, 4);
        assert!(source.path.ends_with("input.xml"));
        assert!(InputSource::from_path(&dir.path().join("gone")).is_err());
    }

    #[test]
    fn detail_tracks_the_replay_position() {
        let mut parser = EventParser::new(vec![Event::open_doc("d"), Event::CloseDoc]);
        assert_eq!(parser.detail(), "event 0 of 2");

        struct Count(usize);
        impl EventSink for Count {
            fn open_doc(&mut self, _: &[u8]) -> Result<()> { self.0 += 1; Ok(()) }
            fn close_doc(&mut self) -> Result<()> { self.0 += 1; Ok(()) }
            fn open_elem(&mut self, _: &[u8], _: &[(Vec<u8>, Vec<u8>)], _: &[(Vec<u8>, Vec<u8>)]) -> Result<()> { Ok(()) }
            fn empty_elem(&mut self, _: &[u8], _: &[(Vec<u8>, Vec<u8>)], _: &[(Vec<u8>, Vec<u8>)]) -> Result<()> { Ok(()) }
            fn close_elem(&mut self) -> Result<()> { Ok(()) }
            fn text(&mut self, _: &[u8]) -> Result<()> { Ok(()) }
            fn comment(&mut self, _: &[u8]) -> Result<()> { Ok(()) }
            fn pi(&mut self, _: &[u8]) -> Result<()> { Ok(()) }
            fn encoding(&mut self, _: &str) {}
        }

        let mut sink = Count(0);
        parser.parse(&mut sink).unwrap();
        assert_eq!(sink.0, 2);
        assert_eq!(parser.detail(), "event 2 of 2");
    }
}
