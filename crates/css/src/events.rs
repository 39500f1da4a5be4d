//! Parser events
//!
//! The parser does not build a document tree. Each grammar production that
//! completes is reported as a [`ParserEvent`] to the listeners registered for
//! its [`EventKind`], in registration order.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{ParseError, Position};
use crate::syntax::{MediaQuery, PropertyName, PropertyValue, Selector, TextUnit};

/// Event names, one per [`ParserEvent`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StartStylesheet,
    EndStylesheet,
    Charset,
    Import,
    Namespace,
    StartMedia,
    EndMedia,
    StartPage,
    EndPage,
    StartPageMargin,
    EndPageMargin,
    StartFontFace,
    EndFontFace,
    StartKeyframes,
    EndKeyframes,
    StartKeyframeRule,
    EndKeyframeRule,
    StartRule,
    EndRule,
    Property,
    Error,
}

impl EventKind {
    /// Every event kind, in the order a stylesheet can produce them
    pub const ALL: [EventKind; 21] = [
        EventKind::StartStylesheet,
        EventKind::Charset,
        EventKind::Import,
        EventKind::Namespace,
        EventKind::StartMedia,
        EventKind::EndMedia,
        EventKind::StartPage,
        EventKind::EndPage,
        EventKind::StartPageMargin,
        EventKind::EndPageMargin,
        EventKind::StartFontFace,
        EventKind::EndFontFace,
        EventKind::StartKeyframes,
        EventKind::EndKeyframes,
        EventKind::StartKeyframeRule,
        EventKind::EndKeyframeRule,
        EventKind::StartRule,
        EventKind::EndRule,
        EventKind::Property,
        EventKind::Error,
        EventKind::EndStylesheet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::StartStylesheet => "startstylesheet",
            EventKind::EndStylesheet => "endstylesheet",
            EventKind::Charset => "charset",
            EventKind::Import => "import",
            EventKind::Namespace => "namespace",
            EventKind::StartMedia => "startmedia",
            EventKind::EndMedia => "endmedia",
            EventKind::StartPage => "startpage",
            EventKind::EndPage => "endpage",
            EventKind::StartPageMargin => "startpagemargin",
            EventKind::EndPageMargin => "endpagemargin",
            EventKind::StartFontFace => "startfontface",
            EventKind::EndFontFace => "endfontface",
            EventKind::StartKeyframes => "startkeyframes",
            EventKind::EndKeyframes => "endkeyframes",
            EventKind::StartKeyframeRule => "startkeyframerule",
            EventKind::EndKeyframeRule => "endkeyframerule",
            EventKind::StartRule => "startrule",
            EventKind::EndRule => "endrule",
            EventKind::Property => "property",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural notification from the parser
#[derive(Debug, Clone, PartialEq)]
pub enum ParserEvent {
    StartStylesheet,
    EndStylesheet,
    Charset {
        /// Charset name without quotes
        charset: String,
        position: Position,
    },
    Import {
        uri: String,
        media: Vec<MediaQuery>,
        position: Position,
    },
    Namespace {
        prefix: Option<String>,
        uri: String,
        position: Position,
    },
    StartMedia {
        media: Vec<MediaQuery>,
        position: Position,
    },
    EndMedia {
        media: Vec<MediaQuery>,
        position: Position,
    },
    StartPage {
        id: Option<String>,
        pseudo: Option<String>,
        position: Position,
    },
    EndPage {
        id: Option<String>,
        pseudo: Option<String>,
        position: Position,
    },
    StartPageMargin {
        margin: TextUnit,
        position: Position,
    },
    EndPageMargin {
        margin: TextUnit,
        position: Position,
    },
    StartFontFace {
        position: Position,
    },
    EndFontFace {
        position: Position,
    },
    StartKeyframes {
        name: TextUnit,
        position: Position,
    },
    EndKeyframes {
        name: TextUnit,
        position: Position,
    },
    StartKeyframeRule {
        keys: Vec<TextUnit>,
        position: Position,
    },
    EndKeyframeRule {
        keys: Vec<TextUnit>,
        position: Position,
    },
    StartRule {
        selectors: Vec<Selector>,
        position: Position,
    },
    EndRule {
        selectors: Vec<Selector>,
        position: Position,
    },
    Property {
        property: PropertyName,
        value: PropertyValue,
        important: bool,
        position: Position,
    },
    Error {
        error: ParseError,
        position: Position,
    },
}

impl ParserEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ParserEvent::StartStylesheet => EventKind::StartStylesheet,
            ParserEvent::EndStylesheet => EventKind::EndStylesheet,
            ParserEvent::Charset { .. } => EventKind::Charset,
            ParserEvent::Import { .. } => EventKind::Import,
            ParserEvent::Namespace { .. } => EventKind::Namespace,
            ParserEvent::StartMedia { .. } => EventKind::StartMedia,
            ParserEvent::EndMedia { .. } => EventKind::EndMedia,
            ParserEvent::StartPage { .. } => EventKind::StartPage,
            ParserEvent::EndPage { .. } => EventKind::EndPage,
            ParserEvent::StartPageMargin { .. } => EventKind::StartPageMargin,
            ParserEvent::EndPageMargin { .. } => EventKind::EndPageMargin,
            ParserEvent::StartFontFace { .. } => EventKind::StartFontFace,
            ParserEvent::EndFontFace { .. } => EventKind::EndFontFace,
            ParserEvent::StartKeyframes { .. } => EventKind::StartKeyframes,
            ParserEvent::EndKeyframes { .. } => EventKind::EndKeyframes,
            ParserEvent::StartKeyframeRule { .. } => EventKind::StartKeyframeRule,
            ParserEvent::EndKeyframeRule { .. } => EventKind::EndKeyframeRule,
            ParserEvent::StartRule { .. } => EventKind::StartRule,
            ParserEvent::EndRule { .. } => EventKind::EndRule,
            ParserEvent::Property { .. } => EventKind::Property,
            ParserEvent::Error { .. } => EventKind::Error,
        }
    }

    /// Source position of the construct, if the event has one
    pub fn position(&self) -> Option<Position> {
        match self {
            ParserEvent::StartStylesheet | ParserEvent::EndStylesheet => None,
            ParserEvent::Charset { position, .. }
            | ParserEvent::Import { position, .. }
            | ParserEvent::Namespace { position, .. }
            | ParserEvent::StartMedia { position, .. }
            | ParserEvent::EndMedia { position, .. }
            | ParserEvent::StartPage { position, .. }
            | ParserEvent::EndPage { position, .. }
            | ParserEvent::StartPageMargin { position, .. }
            | ParserEvent::EndPageMargin { position, .. }
            | ParserEvent::StartFontFace { position }
            | ParserEvent::EndFontFace { position }
            | ParserEvent::StartKeyframes { position, .. }
            | ParserEvent::EndKeyframes { position, .. }
            | ParserEvent::StartKeyframeRule { position, .. }
            | ParserEvent::EndKeyframeRule { position, .. }
            | ParserEvent::StartRule { position, .. }
            | ParserEvent::EndRule { position, .. }
            | ParserEvent::Property { position, .. }
            | ParserEvent::Error { position, .. } => Some(*position),
        }
    }
}

/// Handle returned by [`EventTarget::add`], used to remove a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Event callback
pub type Listener = Box<dyn FnMut(&ParserEvent)>;

/// Listener table keyed by event kind
#[derive(Default)]
pub struct EventTarget {
    listeners: FxHashMap<EventKind, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one kind of event
    pub fn add(&mut self, kind: EventKind, listener: impl FnMut(&ParserEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(kind).or_default().push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered for `kind`.
    pub fn remove(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let Some(listeners) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Call every listener registered for the event's kind
    pub fn fire(&mut self, event: &ParserEvent) {
        if let Some(listeners) = self.listeners.get_mut(&event.kind()) {
            for (_, listener) in listeners.iter_mut() {
                listener(event);
            }
        }
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .listeners
            .iter()
            .map(|(kind, listeners)| (kind.as_str(), listeners.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventTarget").field("listeners", &counts).finish()
    }
}
