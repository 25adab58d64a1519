use crawl::{
    CrawlConfig, CrawlScene, FrameIndex, FrameRange, FrameSink, InMemorySink, Raster, SceneAssets,
    render_to_sink,
};

fn small_config() -> CrawlConfig {
    CrawlConfig {
        width: 48,
        height: 27,
        fps: 10,
        duration_sec: 5.0,
        text_speed_px_per_sec: 6.0,
        ..CrawlConfig::default()
    }
}

fn scene() -> CrawlScene {
    CrawlScene::new(
        small_config(),
        SceneAssets {
            background: Raster::solid(60, 40, [200, 100, 50, 255]),
            logo: Raster::solid(30, 10, [255, 255, 255, 255]),
            text: Raster::solid(30, 60, [0, 255, 255, 255]),
        },
    )
    .unwrap()
}

#[test]
fn renders_range_into_sink_in_order() {
    let s = scene();
    let mut sink = InMemorySink::new();
    let range = FrameRange::new(FrameIndex(5), FrameIndex(12)).unwrap();

    let stats = render_to_sink(&s, range, &mut sink, None).unwrap();
    assert_eq!(stats.frames_total, 7);

    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height), (48, 27));
    assert_eq!(cfg.fps.num, 10);
    assert!(cfg.audio.is_none());
    assert!(sink.is_ended());

    let indices: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(indices, (5..12).collect::<Vec<_>>());
    for (_, f) in sink.frames() {
        assert_eq!(f.data.len(), 48 * 27 * 4);
        assert!(f.data.chunks_exact(4).all(|p| p[3] == 255));
    }
}

#[test]
fn empty_range_is_rejected() {
    let s = scene();
    let mut sink = InMemorySink::new();
    let range = FrameRange::new(FrameIndex(3), FrameIndex(3)).unwrap();
    let err = render_to_sink(&s, range, &mut sink, None).unwrap_err();
    assert!(err.to_string().contains("validation error:"));
    assert!(sink.config().is_none());
}

#[test]
fn background_larger_than_canvas_is_cropped_at_origin() {
    let s = scene();
    // Past the logo and before the crawl reaches the top.
    let f = s.render_frame(FrameIndex(35)).unwrap();
    assert_eq!(&f.data[0..4], &[120, 60, 30, 255]);
}

#[test]
fn frames_are_deterministic() {
    let s = scene();
    let a = s.render_frame(FrameIndex(33)).unwrap();
    let b = s.render_frame(FrameIndex(33)).unwrap();
    assert_eq!(a.data, b.data);
}

#[test]
fn logo_fades_during_its_last_second() {
    let s = CrawlScene::new(
        CrawlConfig {
            text_start_sec: 4.0,
            ..small_config()
        },
        SceneAssets {
            background: Raster::solid(60, 40, [200, 100, 50, 255]),
            logo: Raster::solid(30, 10, [255, 255, 255, 255]),
            text: Raster::solid(30, 60, [0, 255, 255, 255]),
        },
    )
    .unwrap();
    // t = 2.5s: logo at scale 0.1 of 81x27 and half opacity over the darkened background.
    let f = s.render_frame(FrameIndex(25)).unwrap();
    let (cx, cy) = (24usize, 13usize);
    let p = &f.data[(cy * 48 + cx) * 4..(cy * 48 + cx) * 4 + 4];
    // 0.5 * 255 + 0.5 * [120, 60, 30], within rounding.
    assert!((i32::from(p[0]) - 187).abs() <= 2, "{p:?}");
    assert!((i32::from(p[1]) - 157).abs() <= 2, "{p:?}");
    assert!((i32::from(p[2]) - 142).abs() <= 2, "{p:?}");
}

#[test]
fn invalid_config_fails_scene_construction() {
    let cfg = CrawlConfig {
        warp_cx: 0.7,
        ..small_config()
    };
    let err = CrawlScene::new(
        cfg,
        SceneAssets {
            background: Raster::solid(1, 1, [0, 0, 0, 255]),
            logo: Raster::transparent(0, 0),
            text: Raster::solid(1, 1, [0, 0, 0, 255]),
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("warp_cx"));
}

#[test]
fn sink_rejects_frames_before_begin() {
    let mut sink = InMemorySink::new();
    let frame = scene().render_frame(FrameIndex(0)).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
}
