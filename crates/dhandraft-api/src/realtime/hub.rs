use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

/// Outbound half of one socket; the socket's writer drains the receiver.
pub type Outbound = UnboundedSender<String>;

/// Alert sockets grouped by user. A user may hold several connections.
#[derive(Default)]
pub struct AlertHub {
    connections: DashMap<String, Vec<(Uuid, Outbound)>>,
}

impl AlertHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, user_id: &str, tx: Outbound) -> Uuid {
        let conn_id = Uuid::new_v4();
        self.connections
            .entry(user_id.to_string())
            .or_default()
            .push((conn_id, tx));
        debug!(user_id, %conn_id, "alert socket registered");
        conn_id
    }

    pub fn disconnect(&self, user_id: &str, conn_id: Uuid) {
        if let Some(mut entry) = self.connections.get_mut(user_id) {
            entry.retain(|(id, _)| *id != conn_id);
        }
        self.connections
            .remove_if(user_id, |_, conns| conns.is_empty());
    }

    /// Queues `frame` on every connection of `user_id`. Returns how many accepted it.
    pub fn send_to_user(&self, user_id: &str, frame: &str) -> usize {
        let delivered = match self.connections.get_mut(user_id) {
            Some(mut conns) => {
                conns.retain(|(_, tx)| tx.send(frame.to_string()).is_ok());
                conns.len()
            }
            None => 0,
        };
        self.connections
            .remove_if(user_id, |_, conns| conns.is_empty());
        delivered
    }

    /// Queues `frame` on every alert connection. Dead connections are pruned.
    pub fn broadcast_all(&self, frame: &str) -> usize {
        let mut delivered = 0;
        for mut entry in self.connections.iter_mut() {
            entry.retain(|(_, tx)| tx.send(frame.to_string()).is_ok());
            delivered += entry.len();
        }
        self.connections.retain(|_, conns| !conns.is_empty());
        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.connections.iter().map(|entry| entry.len()).sum()
    }

    pub fn user_count(&self) -> usize {
        self.connections.len()
    }
}

/// Every open chat socket, keyed by connection id.
#[derive(Default)]
pub struct ChatHub {
    connections: DashMap<Uuid, Outbound>,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, tx: Outbound) -> Uuid {
        let conn_id = Uuid::new_v4();
        self.connections.insert(conn_id, tx);
        conn_id
    }

    pub fn disconnect(&self, conn_id: Uuid) {
        self.connections.remove(&conn_id);
    }

    pub fn broadcast(&self, frame: &str) -> usize {
        self.connections
            .retain(|_, tx| tx.send(frame.to_string()).is_ok());
        self.connections.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
