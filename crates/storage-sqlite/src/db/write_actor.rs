use super::DbPool;
use crate::errors::StorageError;
use bookdrive_core::errors::{DatabaseError, Error, Result};
use diesel::SqliteConnection;
use log::error;
use std::any::Any;
use tokio::sync::{mpsc, oneshot};

type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;
type AnyResult = Result<Box<dyn Any + Send + 'static>>;
type Envelope = (Job<Box<dyn Any + Send + 'static>>, oneshot::Sender<AnyResult>);

/// Handle for sending jobs to the writer actor.
///
/// Every job runs inside one `BEGIN IMMEDIATE` transaction on the actor's
/// dedicated connection. A job returning `Err` rolls back everything it wrote.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Envelope>,
}

impl WriteHandle {
    /// Executes a database job on the writer connection and waits for its result.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| writer_gone("writer actor stopped accepting jobs"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| writer_gone("writer actor dropped the reply"))??;

        boxed
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| writer_gone("writer actor returned an unexpected type"))
    }
}

fn writer_gone(message: &str) -> Error {
    Error::Database(DatabaseError::Internal(message.to_string()))
}

/// Spawns the single database writer.
///
/// The actor holds one pooled connection for its whole lifetime and processes
/// jobs in arrival order. It stops once every [`WriteHandle`] is dropped.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(1024);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Writer actor could not acquire a connection: {}", e);
                // Dropping the receiver makes every pending exec fail.
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: AnyResult = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(Error::from);

            // The requester may have gone away.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}
