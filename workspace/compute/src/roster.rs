//! Client list controller with confirmation-gated actions.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument};

use common::{ClientDto, ClientStatus, DateWindow};

use crate::gateway::{Confirm, GatewayError, Outcome};
use crate::generation::{Latest, Ticket};

#[async_trait]
pub trait ClientGateway: Send + Sync {
    /// Lists the clients with their totals for `window`, when given.
    async fn list_clients(&self, window: Option<DateWindow>) -> Result<Vec<ClientDto>, GatewayError>;

    async fn delete_client(&self, client_id: i32) -> Result<(), GatewayError>;

    async fn set_client_status(
        &self,
        client_id: i32,
        status: ClientStatus,
    ) -> Result<ClientDto, GatewayError>;
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Client {0} is not in the list")]
    UnknownClient(i32),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub struct ClientRoster<G> {
    gateway: G,
    clients: Latest<Vec<ClientDto>>,
}

impl<G: ClientGateway> ClientRoster<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            clients: Latest::new(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn clients(&self) -> &[ClientDto] {
        self.clients.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn begin_load(&self) -> Ticket {
        self.clients.begin()
    }

    /// Applies a fetched list unless a newer load was started.
    pub fn finish_load(&mut self, ticket: Ticket, clients: Vec<ClientDto>) -> bool {
        self.clients.offer(ticket, clients)
    }

    #[instrument(skip(self))]
    pub async fn load(&mut self, window: Option<DateWindow>) -> Result<bool, RosterError> {
        let ticket = self.begin_load();
        let clients = self.gateway.list_clients(window).await?;
        Ok(self.finish_load(ticket, clients))
    }

    fn client(&self, client_id: i32) -> Result<&ClientDto, RosterError> {
        self.clients()
            .iter()
            .find(|c| c.id == client_id)
            .ok_or(RosterError::UnknownClient(client_id))
    }

    /// Deletes a client and everything attached to it. Nothing happens unless
    /// the user confirms.
    #[instrument(skip(self, confirm))]
    pub async fn delete_client(
        &mut self,
        client_id: i32,
        confirm: &dyn Confirm,
    ) -> Result<Outcome, RosterError> {
        let prompt = format!(
            "Delete client \"{}\" and all of its campaigns, deals and notes?",
            self.client(client_id)?.name
        );
        if !confirm.confirm(&prompt) {
            debug!("Client deletion cancelled");
            return Ok(Outcome::Cancelled);
        }

        self.gateway.delete_client(client_id).await?;
        if let Some(clients) = self.clients.get_mut() {
            clients.retain(|c| c.id != client_id);
        }
        info!("Client deleted");
        Ok(Outcome::Applied)
    }

    pub async fn pause_client(
        &mut self,
        client_id: i32,
        confirm: &dyn Confirm,
    ) -> Result<Outcome, RosterError> {
        let prompt = format!("Pause client \"{}\"?", self.client(client_id)?.name);
        self.change_status(client_id, ClientStatus::Paused, &prompt, confirm).await
    }

    pub async fn reactivate_client(
        &mut self,
        client_id: i32,
        confirm: &dyn Confirm,
    ) -> Result<Outcome, RosterError> {
        let prompt = format!("Reactivate client \"{}\"?", self.client(client_id)?.name);
        self.change_status(client_id, ClientStatus::Active, &prompt, confirm).await
    }

    async fn change_status(
        &mut self,
        client_id: i32,
        status: ClientStatus,
        prompt: &str,
        confirm: &dyn Confirm,
    ) -> Result<Outcome, RosterError> {
        if !confirm.confirm(prompt) {
            return Ok(Outcome::Cancelled);
        }

        let row = self.gateway.set_client_status(client_id, status).await?;
        if let Some(client) = self
            .clients
            .get_mut()
            .and_then(|clients| clients.iter_mut().find(|c| c.id == client_id))
        {
            // The status endpoint does not compute totals
            let totals = client.totals.take();
            *client = ClientDto { totals, ..row };
        }
        info!(client_id, ?status, "Client status changed");
        Ok(Outcome::Applied)
    }
}
