//! End-to-end site storage through the async facade

use relay::{
    Error, FileStorage, MemoryStorage, NewSite, NoColorSource, Rgba, Site, SiteStore, Sites,
    StorageArea,
};

const WHITE: Rgba = Rgba::opaque(255, 255, 255);

async fn memory_sites() -> Sites {
    Sites::with_color_source(MemoryStorage::new(), NoColorSource)
        .await
        .expect("Failed to start worker")
}

fn expected(abbreviation: &str, id: u64) -> Site {
    Site {
        url: "/".to_string(),
        abbreviation: abbreviation.to_string(),
        color: WHITE,
        custom_color: None,
        id: Some(id),
    }
}

/// Create and add `n` white sites one at a time, abbreviated "0", "1", ...
async fn add_one_by_one(sites: &Sites, n: usize) {
    for i in 0..n {
        let site = sites
            .create_site("/", &i.to_string(), Some(WHITE))
            .await
            .unwrap();
        sites.add_sites(vec![site]).await.unwrap();
    }
}

#[tokio::test]
async fn create_with_color_hint() {
    let sites = memory_sites().await;
    let site = sites
        .create_site("http://www.antarcticapps.com/", "Aa", Some(Rgba::from([1, 4, 9, 255])))
        .await
        .unwrap();
    assert_eq!(
        site,
        Site {
            url: "http://www.antarcticapps.com/".to_string(),
            abbreviation: "Aa".to_string(),
            color: Rgba::new(1, 4, 9, 255),
            custom_color: None,
            id: None,
        }
    );
}

#[tokio::test]
async fn create_with_bad_url_defaults_to_black() {
    let sites = memory_sites().await;
    let site = sites.create_site("/", "Aa", None).await.unwrap();
    assert_eq!(site.color, Rgba::new(0, 0, 0, 255));
    assert!(site.id.is_none());
}

#[tokio::test]
async fn next_id_defaults_to_zero_and_counts_additions() {
    let sites = memory_sites().await;
    assert_eq!(sites.get_next_id().await.unwrap(), 0);

    add_one_by_one(&sites, 1).await;
    assert_eq!(sites.get_next_id().await.unwrap(), 1);

    let batch = sites
        .create_sites(vec![
            NewSite::new("/", "1", Some(WHITE)),
            NewSite::new("/", "2", Some(WHITE)),
        ])
        .await
        .unwrap();
    let added = sites.add_sites(batch).await.unwrap();
    assert_eq!(added.iter().map(|s| s.id).collect::<Vec<_>>(), vec![Some(1), Some(2)]);
    assert_eq!(sites.get_next_id().await.unwrap(), 3);
}

#[tokio::test]
async fn added_site_is_stored_and_counted() {
    let sites = memory_sites().await;
    add_one_by_one(&sites, 1).await;

    let all = sites.get_all_sites().await.unwrap();
    assert_eq!(all, vec![expected("0", 0)]);
    assert_eq!(sites.get_sites_count().await.unwrap(), 1);
}

#[tokio::test]
async fn sorted_ids_follow_additions_and_reorders() {
    let sites = memory_sites().await;
    assert!(sites.get_sorted_site_ids().await.unwrap().is_empty());

    let batch = sites
        .create_sites(vec![
            NewSite::new("/", "0", Some(WHITE)),
            NewSite::new("/", "1", Some(WHITE)),
        ])
        .await
        .unwrap();
    sites.add_sites(batch).await.unwrap();
    assert_eq!(sites.get_sorted_site_ids().await.unwrap(), vec![0, 1]);

    sites.reorder_site(1, 0).await.unwrap();
    let ids = sites.get_sorted_site_ids().await.unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids, vec![1, 0]);
    assert_eq!(sites.get_next_id().await.unwrap(), 2);
}

#[tokio::test]
async fn multiple_saved_sites_come_back_in_order() {
    let sites = memory_sites().await;
    add_one_by_one(&sites, 2).await;

    let all = sites.get_all_sites().await.unwrap();
    assert_eq!(all, vec![expected("0", 0), expected("1", 1)]);
}

#[tokio::test]
async fn removing_a_site_drops_record_and_index_entry() {
    let sites = memory_sites().await;
    add_one_by_one(&sites, 1).await;

    sites.remove_sites(&[0]).await.unwrap();
    assert!(sites.get_all_sites().await.unwrap().is_empty());
    assert!(sites.get_site(0).await.unwrap().is_none());
    assert!(sites.get_sorted_site_ids().await.unwrap().is_empty());
    assert_eq!(sites.get_next_id().await.unwrap(), 1);
}

#[tokio::test]
async fn removing_several_sites_keeps_the_rest() {
    let sites = memory_sites().await;
    add_one_by_one(&sites, 3).await;

    sites.remove_sites(&[0, 2]).await.unwrap();
    let all = sites.get_all_sites().await.unwrap();
    assert_eq!(all, vec![expected("1", 1)]);
    assert_eq!(sites.get_sorted_site_ids().await.unwrap(), vec![1]);
    assert_eq!(sites.get_sites_count().await.unwrap(), 1);
}

#[tokio::test]
async fn abbreviation_can_change() {
    let sites = memory_sites().await;
    add_one_by_one(&sites, 1).await;

    sites.update_site_abbreviation(0, "Re").await.unwrap();
    assert_eq!(sites.get_site(0).await.unwrap(), Some(expected("Re", 0)));
}

#[tokio::test]
async fn color_can_change() {
    let sites = memory_sites().await;
    add_one_by_one(&sites, 1).await;

    sites.update_site_color(0, [0, 0, 0]).await.unwrap();
    let site = sites.get_site(0).await.unwrap().unwrap();
    assert_eq!(site.color, Rgba::new(0, 0, 0, 255));
    assert!(site.custom_color.is_none());
}

#[tokio::test]
async fn custom_color_is_kept_next_to_color() {
    let sites = memory_sites().await;
    add_one_by_one(&sites, 1).await;

    sites.update_site_custom_color(0, [0, 0, 0]).await.unwrap();
    let site = sites.get_site(0).await.unwrap().unwrap();
    assert_eq!(site.color, WHITE);
    assert_eq!(site.custom_color, Some(Rgba::new(0, 0, 0, 255)));
    assert_eq!(site.effective_color(), Rgba::new(0, 0, 0, 255));
}

#[tokio::test]
async fn site_and_abbreviation_by_url() {
    let sites = memory_sites().await;
    let created = sites.create_site("/", "Te", Some(WHITE)).await.unwrap();
    sites.add_sites(vec![created]).await.unwrap();

    assert_eq!(sites.get_site_for_url("/").await.unwrap(), Some(expected("Te", 0)));
    assert_eq!(
        sites.get_site_abbreviation_for_url("/").await.unwrap().as_deref(),
        Some("Te")
    );
    assert!(sites.get_site_for_url("/other").await.unwrap().is_none());
}

#[tokio::test]
async fn refresh_without_favicons_resets_colors() {
    let sites = memory_sites().await;
    add_one_by_one(&sites, 2).await;

    assert!(sites.update_favicon_color_for_all_sites().await.unwrap());
    for site in sites.get_all_sites().await.unwrap() {
        assert_eq!(site.color, Rgba::default());
    }
}

#[tokio::test]
async fn closed_worker_reports_error() {
    let sites = memory_sites().await;
    let other = sites.clone();
    sites.close().await.unwrap();

    let res = other.get_next_id().await;
    assert!(matches!(res, Err(Error::WorkerClosed(_))));
}

#[tokio::test]
async fn file_backed_sites_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sites.json");

    let sites = Sites::with_color_source(FileStorage::open(&path).unwrap(), NoColorSource)
        .await
        .unwrap();
    add_one_by_one(&sites, 3).await;
    sites.remove_sites(&[1]).await.unwrap();
    sites.reorder_site(1, 0).await.unwrap();
    sites.close().await.unwrap();

    let store = SiteStore::new(FileStorage::open(&path).unwrap());
    assert_eq!(store.get_sorted_site_ids().unwrap(), vec![2, 0]);
    assert_eq!(store.get_next_id().unwrap(), 3);
    assert_eq!(store.get_sites_count().unwrap(), 2);
    assert!(store.storage().get("s1").unwrap().is_none());
    assert_eq!(store.get_all_sites().unwrap(), vec![expected("2", 2), expected("0", 0)]);
}
