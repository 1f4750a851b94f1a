use crate::favicon::ColorSource;
use crate::storage::StorageArea;
use crate::{Error, NewSite, RelayConfig, Result, Rgba, Site, SiteId, SiteStore};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Create(NewSite, oneshot::Sender<Site>),
    Add(Vec<Site>, oneshot::Sender<Result<Vec<Site>>>),

    GetAll(oneshot::Sender<Result<Vec<Site>>>),
    Get(SiteId, oneshot::Sender<Result<Option<Site>>>),
    GetForUrl(String, oneshot::Sender<Result<Option<Site>>>),
    Count(oneshot::Sender<Result<usize>>),
    NextId(oneshot::Sender<Result<SiteId>>),
    SortedIds(oneshot::Sender<Result<Vec<SiteId>>>),

    UpdateAbbreviation(SiteId, String, oneshot::Sender<Result<()>>),
    UpdateColor(SiteId, Rgba, oneshot::Sender<Result<()>>),
    UpdateCustomColor(SiteId, Rgba, oneshot::Sender<Result<()>>),
    RefreshFaviconColors(oneshot::Sender<bool>),

    Remove(Vec<SiteId>, oneshot::Sender<Result<()>>),
    Reorder(usize, usize, oneshot::Sender<Result<()>>),

    Close(oneshot::Sender<()>),
}

/// An async-friendly handle to a site store backed by a dedicated worker thread.
///
/// The worker thread owns the [`SiteStore`] and the [`ColorSource`] and runs
/// commands one at a time in the order they were sent. Favicon fetches are
/// blocking, so keeping them on the worker keeps them off the async runtime.
#[derive(Clone)]
pub struct Sites {
    cmd_tx: Sender<Command>,
}

impl Sites {
    /// Start a worker over `storage`, sampling favicons with the given config.
    ///
    /// Without the `favicon` feature sites created without a color hint get
    /// the default color.
    pub async fn new<S>(storage: S, config: RelayConfig) -> Result<Self>
    where
        S: StorageArea + 'static,
    {
        Self::spawn(storage, move || -> Result<Box<dyn ColorSource>> {
            #[cfg(feature = "favicon")]
            {
                Ok(Box::new(crate::favicon::FaviconSampler::new(config)?))
            }
            #[cfg(not(feature = "favicon"))]
            {
                let _ = config;
                Ok(Box::new(crate::favicon::NoColorSource))
            }
        })
        .await
    }

    /// Start a worker with a caller-supplied color source
    pub async fn with_color_source<S, C>(storage: S, source: C) -> Result<Self>
    where
        S: StorageArea + 'static,
        C: ColorSource + 'static,
    {
        Self::spawn(storage, move || -> Result<Box<dyn ColorSource>> { Ok(Box::new(source)) })
            .await
    }

    async fn spawn<S, F>(storage: S, make_source: F) -> Result<Self>
    where
        S: StorageArea + 'static,
        F: FnOnce() -> Result<Box<dyn ColorSource>> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            // The color source is built here so a blocking HTTP client never
            // lives on the async runtime.
            let source = match make_source() {
                Ok(s) => s,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let mut store = SiteStore::new(storage);
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Create(new, resp) => {
                        let site = Site::create(new.url, new.abbreviation, new.hint, &*source);
                        let _ = resp.send(site);
                    }
                    Command::Add(mut sites, resp) => {
                        let res = store.add_sites(&mut sites).map(|()| sites);
                        let _ = resp.send(res);
                    }
                    Command::GetAll(resp) => {
                        let _ = resp.send(store.get_all_sites());
                    }
                    Command::Get(id, resp) => {
                        let _ = resp.send(store.get_site(id));
                    }
                    Command::GetForUrl(url, resp) => {
                        let _ = resp.send(store.get_site_for_url(&url));
                    }
                    Command::Count(resp) => {
                        let _ = resp.send(store.get_sites_count());
                    }
                    Command::NextId(resp) => {
                        let _ = resp.send(store.get_next_id());
                    }
                    Command::SortedIds(resp) => {
                        let _ = resp.send(store.get_sorted_site_ids());
                    }
                    Command::UpdateAbbreviation(id, abbreviation, resp) => {
                        let _ = resp.send(store.update_site_abbreviation(id, &abbreviation));
                    }
                    Command::UpdateColor(id, color, resp) => {
                        let _ = resp.send(store.update_site_color(id, color));
                    }
                    Command::UpdateCustomColor(id, color, resp) => {
                        let _ = resp.send(store.update_site_custom_color(id, color));
                    }
                    Command::RefreshFaviconColors(resp) => {
                        let _ = resp.send(store.update_favicon_color_for_all_sites(&*source));
                    }
                    Command::Remove(ids, resp) => {
                        let _ = resp.send(store.remove_sites(&ids));
                    }
                    Command::Reorder(from, to, resp) => {
                        let _ = resp.send(store.reorder_site(from, to));
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(());
                        break;
                    }
                }
            }
        });

        init_rx
            .await
            .map_err(|e| Error::WorkerClosed(format!("Worker init canceled: {}", e)))??;

        Ok(Self { cmd_tx })
    }

    async fn request<T>(
        &self,
        what: &str,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::WorkerClosed(format!("{} not sent", what)))?;
        rx.await
            .map_err(|e| Error::WorkerClosed(format!("{} canceled: {}", what, e)))
    }

    /// Build a pending site; see [`Site::create`]
    pub async fn create_site(
        &self,
        url: &str,
        abbreviation: &str,
        hint: Option<Rgba>,
    ) -> Result<Site> {
        let new = NewSite::new(url, abbreviation, hint);
        self.request("Create", |tx| Command::Create(new, tx)).await
    }

    /// Build several pending sites; results keep the input order
    pub async fn create_sites(&self, new: Vec<NewSite>) -> Result<Vec<Site>> {
        let pending = new
            .into_iter()
            .map(|n| self.request("Create", move |tx| Command::Create(n, tx)));
        futures::future::try_join_all(pending).await
    }

    /// Insert pending sites and return them with their assigned IDs
    pub async fn add_sites(&self, sites: Vec<Site>) -> Result<Vec<Site>> {
        self.request("Add", |tx| Command::Add(sites, tx)).await?
    }

    pub async fn get_all_sites(&self) -> Result<Vec<Site>> {
        self.request("GetAll", Command::GetAll).await?
    }

    pub async fn get_site(&self, id: SiteId) -> Result<Option<Site>> {
        self.request("Get", |tx| Command::Get(id, tx)).await?
    }

    pub async fn get_site_for_url(&self, url: &str) -> Result<Option<Site>> {
        let url = url.to_string();
        self.request("GetForUrl", |tx| Command::GetForUrl(url, tx)).await?
    }

    pub async fn get_site_abbreviation_for_url(&self, url: &str) -> Result<Option<String>> {
        Ok(self.get_site_for_url(url).await?.map(|s| s.abbreviation))
    }

    pub async fn get_sites_count(&self) -> Result<usize> {
        self.request("Count", Command::Count).await?
    }

    pub async fn get_next_id(&self) -> Result<SiteId> {
        self.request("NextId", Command::NextId).await?
    }

    pub async fn get_sorted_site_ids(&self) -> Result<Vec<SiteId>> {
        self.request("SortedIds", Command::SortedIds).await?
    }

    pub async fn update_site_abbreviation(&self, id: SiteId, abbreviation: &str) -> Result<()> {
        let abbreviation = abbreviation.to_string();
        self.request("UpdateAbbreviation", |tx| {
            Command::UpdateAbbreviation(id, abbreviation, tx)
        })
        .await?
    }

    pub async fn update_site_color(&self, id: SiteId, color: impl Into<Rgba>) -> Result<()> {
        let color = color.into();
        self.request("UpdateColor", |tx| Command::UpdateColor(id, color, tx))
            .await?
    }

    pub async fn update_site_custom_color(&self, id: SiteId, color: impl Into<Rgba>) -> Result<()> {
        let color = color.into();
        self.request("UpdateCustomColor", |tx| {
            Command::UpdateCustomColor(id, color, tx)
        })
        .await?
    }

    /// Re-sample every stored site's favicon; `true` once the batch is written
    pub async fn update_favicon_color_for_all_sites(&self) -> Result<bool> {
        self.request("RefreshFaviconColors", Command::RefreshFaviconColors)
            .await
    }

    pub async fn remove_sites(&self, ids: &[SiteId]) -> Result<()> {
        let ids = ids.to_vec();
        self.request("Remove", |tx| Command::Remove(ids, tx)).await?
    }

    pub async fn reorder_site(&self, from: usize, to: usize) -> Result<()> {
        self.request("Reorder", |tx| Command::Reorder(from, to, tx))
            .await?
    }

    /// Stop the worker thread. Other clones of this handle stop working too.
    pub async fn close(self) -> Result<()> {
        self.request("Close", Command::Close).await
    }
}
