//! TCP Server
//!
//! Accepts connections and serves one request per connection, either inline
//! on the accept thread or on a worker pool.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, SendTimeoutError, Sender};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{DirKvError, Result};

use super::Connection;

/// Cloneable "stop accepting" flag shared with signal handlers and tests
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the accept loop to stop; in-flight requests still finish
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// The raw flag, for `signal_hook::flag::register`
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// TCP server for dirkv
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind `config.listen_addr` and create a server
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            DirKvError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        Self::from_listener(listener, config, engine)
    }

    /// Create a server around an already bound listener
    pub fn from_listener(listener: TcpListener, config: Config, engine: Arc<Engine>) -> Result<Self> {
        // Polled so the shutdown flag is noticed between accepts
        listener.set_nonblocking(true).map_err(|e| {
            DirKvError::Network(format!("failed to make listener non-blocking: {}", e))
        })?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: ShutdownHandle::new(),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops this server when triggered
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to stop accepting connections
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Listening on {} ({})",
            self.local_addr()?,
            match self.config.workers {
                0 => "serial".to_string(),
                n => format!("{} workers", n),
            }
        );

        if self.config.workers == 0 {
            self.accept_loop(|stream| serve(stream, &self.engine, &self.config));
        } else {
            self.run_pool(self.config.workers)?;
        }

        tracing::info!("Stopped accepting connections");
        Ok(())
    }

    /// Accept on this thread, hand streams to `workers` threads
    fn run_pool(&self, workers: usize) -> Result<()> {
        let (tx, rx) = channel::bounded::<TcpStream>(workers);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let rx = rx.clone();
            let engine = Arc::clone(&self.engine);
            let config = self.config.clone();

            let handle = thread::Builder::new()
                .name(format!("dirkv-worker-{}", id))
                .spawn(move || {
                    for stream in rx.iter() {
                        serve(stream, &engine, &config);
                    }
                })?;
            handles.push(handle);
        }
        drop(rx);

        self.accept_loop(|stream| self.hand_off(&tx, stream));

        // Closing the channel lets workers drain the queue and exit
        drop(tx);
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }
        Ok(())
    }

    /// Queue a stream for the workers, giving up if shutdown is requested
    /// while the queue stays full
    fn hand_off(&self, tx: &Sender<TcpStream>, mut stream: TcpStream) {
        let idle = self.poll_interval();

        loop {
            match tx.send_timeout(stream, idle) {
                Ok(()) => return,
                Err(SendTimeoutError::Timeout(back)) => {
                    if self.shutdown.is_shutdown() {
                        tracing::warn!("Shutting down with a full queue, dropping connection");
                        return;
                    }
                    stream = back;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    tracing::error!("All workers are gone, dropping connection");
                    return;
                }
            }
        }
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.accept_poll_ms.max(1))
    }

    fn accept_loop<F: FnMut(TcpStream)>(&self, mut on_connection: F) {
        let idle = self.poll_interval();

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    // Some platforms hand out streams inheriting the listener's mode
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", addr, e);
                        continue;
                    }
                    tracing::trace!("Accepted connection from {}", addr);
                    on_connection(stream);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(idle),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(idle);
                }
            }
        }
    }
}

/// Serve one connection; failures stay local to it
fn serve(stream: TcpStream, engine: &Arc<Engine>, config: &Config) {
    let result = Connection::new(stream, Arc::clone(engine)).and_then(|mut connection| {
        connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;
        connection.handle()
    });

    if let Err(e) = result {
        tracing::warn!("Connection failed: {}", e);
    }
}
