//! Blocking facade that runs operations over a [`Transport`].
//!
//! Every method sends exactly one request and returns `Result`; failures are
//! logged with the operation name, status and server message, then returned
//! as values. Nothing is retried.

use tracing::{debug, error, info};

use crate::client::{Operation, VaultClient};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Command, Insertion, NoteJson, Period, SearchQuery, SearchResult, ServerStatus,
    SimpleSearchResult,
};

/// A `VaultClient` paired with the transport that executes its requests.
#[derive(Debug, Clone)]
pub struct Vault<T: Transport = UreqTransport> {
    client: VaultClient,
    transport: T,
}

impl Vault<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = UreqTransport::from_config(config)?;
        Ok(Self::with_transport(
            VaultClient::new(&config.base_url, &config.token),
            transport,
        ))
    }
}

impl<T: Transport> Vault<T> {
    pub fn with_transport(client: VaultClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &VaultClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send the operation's request once and decode the response.
    pub fn execute<R>(&self, operation: Operation<R>) -> Result<R, ApiError> {
        let name = operation.name();
        let request = operation.request();
        debug!(operation = name, method = request.method.as_str(), url = %request.url, "sending request");

        let response = match self.transport.send(request) {
            Ok(response) => response,
            Err(err) => {
                error!(operation = name, error = %err, "request failed");
                return Err(err);
            }
        };

        let status = response.status;
        match operation.parse(response) {
            Ok(value) => {
                info!(operation = name, status, "request succeeded");
                Ok(value)
            }
            Err(err) => {
                error!(operation = name, status, error = %err, "request failed");
                Err(err)
            }
        }
    }

    pub fn get_active_file(&self) -> Result<String, ApiError> {
        self.execute(self.client.get_active_file())
    }

    pub fn append_to_active_file(&self, content: &str) -> Result<(), ApiError> {
        self.execute(self.client.append_to_active_file(content))
    }

    pub fn update_active_file(&self, content: &str) -> Result<(), ApiError> {
        self.execute(self.client.update_active_file(content))
    }

    pub fn delete_active_file(&self) -> Result<(), ApiError> {
        self.execute(self.client.delete_active_file())
    }

    pub fn insert_into_active_file(
        &self,
        content: &str,
        insertion: &Insertion,
    ) -> Result<(), ApiError> {
        self.execute(self.client.insert_into_active_file(content, insertion))
    }

    pub fn get_file(&self, filename: &str) -> Result<String, ApiError> {
        self.execute(self.client.get_file(filename))
    }

    pub fn get_note(&self, filename: &str) -> Result<NoteJson, ApiError> {
        self.execute(self.client.get_note(filename))
    }

    pub fn create_or_update_file(&self, filename: &str, content: &str) -> Result<(), ApiError> {
        self.execute(self.client.create_or_update_file(filename, content))
    }

    pub fn append_to_file(&self, filename: &str, content: &str) -> Result<(), ApiError> {
        self.execute(self.client.append_to_file(filename, content))
    }

    pub fn delete_file(&self, filename: &str) -> Result<(), ApiError> {
        self.execute(self.client.delete_file(filename))
    }

    pub fn insert_into_file(
        &self,
        filename: &str,
        content: &str,
        insertion: &Insertion,
    ) -> Result<(), ApiError> {
        self.execute(self.client.insert_into_file(filename, content, insertion))
    }

    pub fn list_vault(&self) -> Result<Vec<String>, ApiError> {
        self.execute(self.client.list_vault())
    }

    pub fn list_directory(&self, directory: &str) -> Result<Vec<String>, ApiError> {
        self.execute(self.client.list_directory(directory))
    }

    pub fn list_commands(&self) -> Result<Vec<Command>, ApiError> {
        self.execute(self.client.list_commands())
    }

    pub fn run_command(&self, command_id: &str) -> Result<(), ApiError> {
        self.execute(self.client.run_command(command_id))
    }

    pub fn search(&self, query: impl Into<SearchQuery>) -> Result<Vec<SearchResult>, ApiError> {
        self.execute(self.client.search(&query.into()))
    }

    pub fn simple_search(
        &self,
        query: &str,
        context_length: usize,
    ) -> Result<Vec<SimpleSearchResult>, ApiError> {
        self.execute(self.client.simple_search(query, context_length))
    }

    pub fn gui_search(
        &self,
        query: &str,
        context_length: usize,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        self.execute(self.client.gui_search(query, context_length))
    }

    pub fn open_file(&self, filename: &str, new_leaf: bool) -> Result<(), ApiError> {
        self.execute(self.client.open_file(filename, new_leaf))
    }

    pub fn get_periodic_note(&self, period: Period) -> Result<String, ApiError> {
        self.execute(self.client.get_periodic_note(period))
    }

    pub fn update_periodic_note(&self, period: Period, content: &str) -> Result<(), ApiError> {
        self.execute(self.client.update_periodic_note(period, content))
    }

    pub fn append_to_periodic_note(&self, period: Period, content: &str) -> Result<(), ApiError> {
        self.execute(self.client.append_to_periodic_note(period, content))
    }

    pub fn delete_periodic_note(&self, period: Period) -> Result<(), ApiError> {
        self.execute(self.client.delete_periodic_note(period))
    }

    pub fn insert_into_periodic_note(
        &self,
        period: Period,
        content: &str,
        insertion: &Insertion,
    ) -> Result<(), ApiError> {
        self.execute(self.client.insert_into_periodic_note(period, content, insertion))
    }

    pub fn server_status(&self) -> Result<ServerStatus, ApiError> {
        self.execute(self.client.server_status())
    }
}
