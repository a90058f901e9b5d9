use std::path::Path;

use terrain_core::utils::{normalize2, to_gray_image};
use terrain_core::{DeformMethod, Scene, TerrainGenerator, TerrainParams};

// Renders one preview per deformation method and scatters a few rocks
fn main() {
    for method in DeformMethod::ALL {
        let mut scene = Scene::new();
        let mut generator = TerrainGenerator::seeded(2025);
        let params = TerrainParams {
            dimension: 100.0,
            subdivisions: 128,
            method,
            rocks_amount: 10,
            ..Default::default()
        };

        generator.create_and_deform(&mut scene, &params).unwrap();
        let rocks = generator.create_rocks(&mut scene, &params).unwrap();
        for rock in &rocks.rocks {
            println!(
                "{:>8} at ({:>7.2}, {:>6.2}, {:>7.2}) rgb {:.2?}",
                rock.mesh().to_string(),
                rock.position.x,
                rock.position.y,
                rock.position.z,
                rock.color.to_rgb()
            );
        }

        let mut map = generator.deformer().grid().unwrap().heights(&scene).unwrap();
        normalize2(&mut map);
        let file = format!("terrain_{}.png", method.label().to_lowercase().replace(' ', "_"));
        let path = Path::new(&file);
        to_gray_image(&map).save(path).unwrap();
        println!("Saved {} preview to {:?}", method, path);
    }
}
