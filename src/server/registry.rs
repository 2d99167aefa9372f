use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::stream::Room;

/// A configured application and the rooms published or played under it
pub struct App {
    name: String,
    rooms: RwLock<HashMap<String, Arc<Room>>>,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        App {
            name: name.into(),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, stream: &str) -> Option<Arc<Room>> {
        self.rooms.read().await.get(stream).cloned()
    }

    /// Look up a room, creating it on first use
    pub async fn get_or_create(&self, stream: &str) -> Arc<Room> {
        if let Some(room) = self.get(stream).await {
            return room;
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(stream.to_string())
            .or_insert_with(|| {
                log::debug!("Creating room {}/{}", self.name, stream);
                Arc::new(Room::new(self.name.clone(), stream))
            })
            .clone()
    }

    /// Remove a room nobody holds any more. Returns whether it was removed.
    pub async fn remove_if_idle(&self, stream: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let idle = match rooms.get(stream) {
            Some(room) => Arc::strong_count(room) == 1 && room.is_idle().await,
            None => false,
        };
        if idle {
            rooms.remove(stream);
            log::debug!("Removed idle room {}/{}", self.name, stream);
        }
        idle
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

/// Static table of applications, fixed at startup
pub struct Registry {
    apps: HashMap<String, Arc<App>>,
}

impl Registry {
    pub fn new<I, S>(apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let apps = apps
            .into_iter()
            .map(|name| {
                let name = name.into();
                (name.clone(), Arc::new(App::new(name)))
            })
            .collect();
        Registry { apps }
    }

    pub fn app(&self, name: &str) -> Option<Arc<App>> {
        self.apps.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.apps.contains_key(name)
    }
}
