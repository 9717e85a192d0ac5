//! The two stores the playback core talks to.
//!
//! - `SpriteStore` exclusively owns poses and bubbles.
//! - `QueueStore` exclusively owns the per-sprite command queues.
//!
//! Both live behind `Shared` handles so the browser side can read a
//! snapshot for drawing while a playback future is suspended.
use crate::engine::Point;
use crate::sprite::{
    Bubble, Command, Sprite, SpriteContext, SpriteId, SpriteKind, SpritePatch,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

// ELI5: web assembly is single threaded, so Rc RefCell > Arc Mutex
pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

// vertical spacing between freshly added sprites
const SPAWN_ORIGIN: Point = Point { x: 100.0, y: 100.0 };
const SPAWN_SPACING: f64 = 100.0;

/// Proof of which bubble a delayed clear is allowed to remove
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BubbleTicket {
    id: SpriteId,
    generation: u64,
}

impl BubbleTicket {
    pub fn sprite(&self) -> SpriteId {
        self.id
    }
}

#[derive(Debug)]
struct Entry {
    sprite: Sprite,
    // bumped by every bubble change, stale tickets stop matching
    bubble_generation: u64,
}

#[derive(Debug)]
pub struct SpriteStore {
    // creation order doubles as the deterministic step order
    entries: Vec<Entry>,
    next_id: u32,
}

impl Default for SpriteStore {
    fn default() -> Self {
        SpriteStore::new()
    }
}

impl SpriteStore {
    /// Starts with the one sprite that always exists
    pub fn new() -> Self {
        let mut store = SpriteStore {
            entries: Vec::new(),
            next_id: 1,
        };
        store.insert(SpriteKind::Cat, Point::default());
        store
    }

    /// An empty stage, handy when positions are set up by hand
    pub fn empty() -> Self {
        SpriteStore {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// New sprite below the previous ones, heading 0, no bubble
    pub fn add(&mut self, kind: SpriteKind) -> SpriteId {
        let offset = self.entries.len() as f64 * SPAWN_SPACING;
        let position = Point::new(SPAWN_ORIGIN.x, SPAWN_ORIGIN.y + offset);
        self.insert(kind, position)
    }

    /// New sprite at an explicit position
    pub fn insert(&mut self, kind: SpriteKind, position: Point) -> SpriteId {
        let id = SpriteId(self.next_id);
        self.next_id += 1;
        let sprite = Sprite {
            id,
            name: format!("Sprite {}", self.entries.len() + 1),
            kind,
            context: SpriteContext::at(position),
        };
        log::debug!("created {} '{}' at {:?}", id, sprite.name, position);
        self.entries.push(Entry {
            sprite,
            bubble_generation: 0,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &Sprite> {
        self.entries.iter().map(|entry| &entry.sprite)
    }

    pub fn ids(&self) -> Vec<SpriteId> {
        self.all().map(|sprite| sprite.id).collect()
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.entry(id).map(|entry| &entry.sprite)
    }

    /// Merge `patch` into one sprite, `None` for an unknown id
    pub fn update(&mut self, id: SpriteId, patch: &SpritePatch) -> Option<&SpriteContext> {
        let entry = self.entry_mut(id)?;
        if patch.bubble.is_some() {
            entry.bubble_generation += 1;
        }
        entry.sprite.context = entry.sprite.context.clone().apply(patch);
        Some(&entry.sprite.context)
    }

    /// Drag repositioning
    pub fn set_position(&mut self, id: SpriteId, position: Point) -> bool {
        self.update(id, &SpritePatch::position(position)).is_some()
    }

    /// Back to the origin, heading and bubble stay as they are
    pub fn reset_position(&mut self, id: SpriteId) -> bool {
        self.set_position(id, Point::default())
    }

    pub fn reset_bubbles(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.bubble_generation += 1;
            entry.sprite.context.bubble = None;
        }
    }

    /// Show a bubble and hand back the ticket its timed clear must present
    pub fn show_bubble(&mut self, id: SpriteId, bubble: Bubble) -> Option<BubbleTicket> {
        self.update(id, &SpritePatch::bubble(bubble))?;
        self.entry(id).map(|entry| BubbleTicket {
            id,
            generation: entry.bubble_generation,
        })
    }

    /// Clear the bubble unless something newer replaced or reset it
    pub fn clear_bubble(&mut self, ticket: BubbleTicket) -> bool {
        match self.entry(ticket.id) {
            Some(entry) if entry.bubble_generation == ticket.generation => {
                self.update(ticket.id, &SpritePatch::clear_bubble());
                true
            }
            _ => {
                log::debug!("stale bubble ticket for {}, leaving bubble", ticket.id);
                false
            }
        }
    }

    fn entry(&self, id: SpriteId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.sprite.id == id)
    }

    fn entry_mut(&mut self, id: SpriteId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| entry.sprite.id == id)
    }
}

/// Ordered command queue per sprite, keyed by sprite id
#[derive(Debug, Default, Clone)]
pub struct QueueStore {
    queues: HashMap<SpriteId, Vec<Command>>,
}

impl QueueStore {
    pub fn new() -> Self {
        QueueStore::default()
    }

    /// Empty for ids that never had a queue
    pub fn get(&self, id: SpriteId) -> &[Command] {
        self.queues.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self, id: SpriteId) -> usize {
        self.get(id).len()
    }

    pub fn replace(&mut self, id: SpriteId, commands: Vec<Command>) {
        self.queues.insert(id, commands);
    }

    pub fn append(&mut self, id: SpriteId, command: Command) {
        self.queues.entry(id).or_default().push(command);
    }

    pub fn clear(&mut self, id: SpriteId) {
        self.queues.insert(id, Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_sprite_always_exists() {
        let store = SpriteStore::new();
        assert_eq!(store.len(), 1);
        let first = store.all().next().unwrap();
        assert_eq!(first.name, "Sprite 1");
        assert_eq!(first.position(), Point::default());
        assert_eq!(first.rotation(), 0.0);
        assert_eq!(first.bubble(), None);
    }

    #[test]
    fn added_sprites_are_spaced_and_keep_creation_order() {
        let mut store = SpriteStore::new();
        let second = store.add(SpriteKind::Ball);
        let third = store.add(SpriteKind::Cat);
        assert_eq!(store.get(second).unwrap().position(), Point::new(100.0, 200.0));
        assert_eq!(store.get(third).unwrap().position(), Point::new(100.0, 300.0));
        assert_eq!(store.get(third).unwrap().name, "Sprite 3");
        assert_eq!(store.ids()[1..], [second, third]);
    }

    #[test]
    fn ids_are_unique() {
        let mut store = SpriteStore::new();
        let mut ids = store.ids();
        for _ in 0..10 {
            ids.push(store.add(SpriteKind::Ball));
        }
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[test]
    fn update_on_unknown_id_is_ignored() {
        let mut store = SpriteStore::new();
        assert!(store
            .update(SpriteId(99), &SpritePatch::rotation(10.0))
            .is_none());
    }

    #[test]
    fn reset_position_returns_to_origin() {
        let mut store = SpriteStore::new();
        let id = store.add(SpriteKind::Cat);
        store.update(id, &SpritePatch::rotation(90.0));
        let ticket = store.show_bubble(id, Bubble::say("hi")).unwrap();
        assert!(store.reset_position(id));
        let sprite = store.get(id).unwrap();
        assert_eq!(sprite.position(), Point::default());
        assert_eq!(sprite.rotation(), 90.0);
        assert_eq!(sprite.bubble(), Some(&Bubble::say("hi")));

        // the pending clear still owns the bubble
        assert!(store.clear_bubble(ticket));
        assert_eq!(store.get(id).unwrap().bubble(), None);
        assert!(!store.reset_position(SpriteId(99)));
    }

    #[test]
    fn ticket_clears_its_own_bubble() {
        let mut store = SpriteStore::new();
        let id = store.ids()[0];
        let ticket = store.show_bubble(id, Bubble::say("hi")).unwrap();
        assert!(store.clear_bubble(ticket));
        assert_eq!(store.get(id).unwrap().bubble(), None);
    }

    #[test]
    fn stale_ticket_leaves_newer_bubble() {
        let mut store = SpriteStore::new();
        let id = store.ids()[0];
        let old = store.show_bubble(id, Bubble::say("first")).unwrap();
        store.show_bubble(id, Bubble::think("second")).unwrap();
        assert!(!store.clear_bubble(old));
        assert_eq!(store.get(id).unwrap().bubble(), Some(&Bubble::think("second")));
    }

    #[test]
    fn reset_bubbles_invalidates_tickets() {
        let mut store = SpriteStore::new();
        let id = store.ids()[0];
        let ticket = store.show_bubble(id, Bubble::say("hi")).unwrap();
        store.reset_bubbles();
        store.show_bubble(id, Bubble::say("again")).unwrap();
        assert!(!store.clear_bubble(ticket));
    }

    #[test]
    fn queue_store_edits() {
        let mut queues = QueueStore::new();
        let id = SpriteId(1);
        assert!(queues.get(id).is_empty());
        queues.append(id, Command::move_by(10.0));
        queues.append(id, Command::turn(15.0));
        assert_eq!(queues.len(id), 2);
        queues.replace(id, vec![Command::go_to(1.0, 1.0)]);
        assert_eq!(queues.get(id), [Command::go_to(1.0, 1.0)]);
        queues.clear(id);
        assert_eq!(queues.len(id), 0);
    }
}
