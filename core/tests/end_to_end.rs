use glam::DVec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use terrain_core::utils::{normalize2, to_gray_image};
use terrain_core::value2::fractal_noise;
use terrain_core::{
    AmbientColor, DeformMethod, DeformReport, MeshHost, RockScatter, Scene, ScatterRequest,
    TerrainDeformer, TerrainGenerator, TerrainParams,
};

#[test]
fn value_noise_on_reference_grid() {
    let mut scene = Scene::new();
    let mut deformer = TerrainDeformer::default();
    let grid = deformer
        .create_terrain(&mut scene, "myTerrain", 100.0, 10)
        .unwrap()
        .clone();
    assert_eq!(grid.vertex_count(), 121);
    assert_eq!(scene.list_vertices(grid.mesh()).unwrap().len(), 121);

    let report = deformer.value_noise(&mut scene, 6000.0).unwrap();
    assert_eq!(report.vertices, 121);

    let origin = grid.vertex(0, 0).unwrap();
    let expected = fractal_noise(0.0, 0.0, 6000.0) * (7.5 * 1.0 * 3.0);
    assert_eq!(grid.height(&scene, origin).unwrap(), expected);

    // same seed, same field
    let before = grid.heights(&scene).unwrap();
    deformer.value_noise(&mut scene, 6000.0).unwrap();
    assert_eq!(grid.heights(&scene).unwrap(), before);
}

#[test]
fn hue_round_trip() {
    let rgb = AmbientColor::new(120.0, 1.0, 1.0).to_rgb();
    assert!(rgb[0].abs() < 1e-9);
    assert!((rgb[1] - 1.0).abs() < 1e-9);
    assert!(rgb[2].abs() < 1e-9);
}

#[test]
fn rocks_settle_on_deformed_terrain() {
    let mut scene = Scene::new();
    let mut deformer = TerrainDeformer::default();
    deformer.create_terrain(&mut scene, "t", 40.0, 8).unwrap();
    deformer.value_noise(&mut scene, 1234.0).unwrap();
    let grid = deformer.grid().unwrap();

    let heights = grid.heights(&scene).unwrap();
    let lo = heights.iter().flatten().cloned().fold(f32::MAX, f32::min) as f64;
    let hi = heights.iter().flatten().cloned().fold(f32::MIN, f32::max) as f64;

    let mut rng = StdRng::seed_from_u64(77);
    let request = ScatterRequest::new("myRocks", 5);
    let report = RockScatter::default()
        .scatter(&mut scene, Some(grid), grid.dimension(), &request, &mut rng)
        .unwrap();

    assert_eq!(report.rocks.len(), 5);
    assert_eq!(report.projected_count(), 5);
    for rock in &report.rocks {
        let hit = rock.projected.unwrap();
        assert!((rock.position - hit.position).length() < 1e-9);
        assert!(rock.position.y >= lo - 1e-3 && rock.position.y <= hi + 1e-3);
        assert!(hit.normal.dot(DVec3::Y) > 0.0);
        assert_eq!(scene.mesh(rock.mesh()).unwrap().parent(), Some("myRocks_grp"));
    }
}

#[test]
fn session_from_json_params() {
    let params: TerrainParams = serde_json::from_str(
        r#"{
            "terrain_name": "hills",
            "dimension": 100.0,
            "subdivisions": 50,
            "method": "soft_random",
            "rocks_amount": 4,
            "hue": 30.0,
            "saturation": [0.1, 0.3],
            "brightness": [0.4, 0.6]
        }"#,
    )
    .unwrap();
    params.validate().unwrap();

    let mut scene = Scene::new();
    let mut generator = TerrainGenerator::seeded(2024);
    let DeformReport::SoftRandom(report) = generator.create_and_deform(&mut scene, &params).unwrap()
    else {
        panic!("expected the soft random method");
    };
    assert_eq!(report.budget, 52);
    let h = report.height_limit;
    assert!(report.edits.iter().all(|e| e.delta.abs() >= h && e.delta.abs() <= 2.0 * h));

    let rocks = generator.create_rocks(&mut scene, &params).unwrap();
    assert_eq!(rocks.rocks.len(), 4);
    assert!(!rocks.projection_disabled);
    assert_eq!(scene.mesh_count(), 1 + 4);

    let switched = generator
        .modify_terrain(&mut scene, DeformMethod::ValueNoise)
        .unwrap();
    assert_eq!(switched.method(), DeformMethod::ValueNoise);
}

#[test]
fn height_preview_image() {
    let mut scene = Scene::new();
    let mut generator = TerrainGenerator::seeded(5);
    let params = TerrainParams {
        subdivisions: 16,
        method: DeformMethod::ValueNoise,
        ..Default::default()
    };
    generator.create_and_deform(&mut scene, &params).unwrap();

    let mut map = generator
        .deformer()
        .grid()
        .unwrap()
        .heights(&scene)
        .unwrap();
    normalize2(&mut map);
    let img = to_gray_image(&map);
    assert_eq!(img.dimensions(), (17, 17));
    let pixels: Vec<u8> = img.pixels().map(|p| p[0]).collect();
    assert!(pixels.contains(&0) && pixels.contains(&255));
}
