use glam::{Mat4, Vec3, Vec4};
use wgpu_shadow_scene::renderer::shader::{
    bias_matrix, texture_matrix, UniformBinder, OPENGL_TO_WGPU_MATRIX,
};
use wgpu_shadow_scene::renderer::Extent;
use wgpu_shadow_scene::scene::{mouse_transform, Camera, CameraPair, Light};

const EPSILON: f32 = 1e-5;

fn cameras() -> CameraPair {
    CameraPair::new(
        Vec3::new(0.0, 2.0, 6.0),
        Vec3::new(8.0, 4.0, 8.0),
        Extent::new(720, 576),
    )
}

fn mat(m: [[f32; 4]; 4]) -> Mat4 {
    Mat4::from_cols_array_2d(&m)
}

#[test]
fn valid_shapes_give_finite_projections() {
    let mut camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    for (aspect, near, far) in [(720.0 / 576.0, 0.1, 100.0), (16.0 / 9.0, 0.05, 350.0), (0.5, 1.0, 2.0)] {
        camera.set_shape(45.0, aspect, near, far);
        assert!(camera.projection_matrix().is_finite());
        assert!(camera.vp_matrix().is_finite());
    }
}

#[test]
fn bias_maps_clip_cube_onto_unit_cube() {
    let bias = bias_matrix();
    assert!(bias
        .transform_point3(Vec3::splat(-1.0))
        .abs_diff_eq(Vec3::ZERO, EPSILON));
    assert!(bias
        .transform_point3(Vec3::splat(1.0))
        .abs_diff_eq(Vec3::ONE, EPSILON));
    assert!(bias
        .transform_point3(Vec3::ZERO)
        .abs_diff_eq(Vec3::splat(0.5), EPSILON));
}

#[test]
fn texture_matrix_applies_model_first_and_bias_last() {
    let cams = cameras();
    let light = &cams.light;
    let model = Mat4::from_translation(Vec3::new(0.3, -0.5, 1.2)) * Mat4::from_rotation_y(0.7);

    let composed = texture_matrix(model, light.view_matrix(), light.projection_matrix());

    // Step by step: object -> world -> light eye -> light clip -> texture.
    let p = Vec3::new(0.2, 0.4, -0.1).extend(1.0);
    let world = model * p;
    let eye = light.view_matrix() * world;
    let clip = light.projection_matrix() * eye;
    let reference = bias_matrix() * clip;
    assert!((composed * p).abs_diff_eq(reference, EPSILON));

    let expected = bias_matrix() * light.projection_matrix() * light.view_matrix() * model;
    assert!(composed.abs_diff_eq(expected, EPSILON));

    let swapped = model * light.view_matrix() * light.projection_matrix() * bias_matrix();
    assert!(!swapped.abs_diff_eq(composed, 1e-3));
}

#[test]
fn shadow_depth_matches_texture_lookup_depth() {
    // The depth pass writes through OPENGL_TO_WGPU; the shaded pass compares
    // against the biased z. They must agree for the same surface point.
    let cams = cameras();
    let light = Light::new(Vec3::new(8.0, 4.0, 8.0));
    let binder = UniformBinder::new(&cams, &light);
    let model = mouse_transform(10.0, 30.0, Vec3::ZERO);

    let depth = binder.depth_uniforms(model);
    let phong = binder.phong_uniforms(model);

    for point in [Vec3::ZERO, Vec3::new(0.5, 0.2, -0.3), Vec3::new(-1.0, 0.0, 1.0)] {
        let p = point.extend(1.0);
        let written = mat(depth.mvp) * p;
        let lookup = mat(phong.texture_matrix) * p;
        let written_z = written.z / written.w;
        let lookup_z = lookup.z / lookup.w;
        assert!((written_z - lookup_z).abs() < 1e-4, "{written_z} vs {lookup_z}");
        assert!((0.0..=1.0).contains(&written_z));
    }
}

#[test]
fn observer_mvp_is_view_then_projection() {
    let cams = cameras();
    let light = Light::new(Vec3::new(8.0, 4.0, 8.0));
    let binder = UniformBinder::new(&cams, &light);
    let model = Mat4::from_scale(Vec3::splat(5.0));

    let phong = binder.phong_uniforms(model);
    let expected =
        OPENGL_TO_WGPU_MATRIX * cams.view.projection_matrix() * cams.view.view_matrix() * model;
    assert!(mat(phong.mvp).abs_diff_eq(expected, EPSILON));
    assert!(mat(phong.mv).abs_diff_eq(cams.view.view_matrix() * model, EPSILON));
    assert_eq!(phong.light_position, [8.0, 4.0, 8.0, 1.0]);
    assert_eq!(phong.in_colour, [1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn resize_updates_observer_only() {
    let mut cams = cameras();
    let light_projection = cams.light.projection_matrix();

    cams.resize(1920, 1080);

    assert!((cams.view.aspect - 1920.0 / 1080.0).abs() < EPSILON);
    assert!(cams.light.projection_matrix().abs_diff_eq(light_projection, 0.0));
    assert!((cams.light.aspect - 1024.0 / 768.0).abs() < EPSILON);
}

#[test]
fn spin_y_ninety_rotates_before_translating() {
    let pure = mouse_transform(0.0, 90.0, Vec3::ZERO);
    assert!(pure.abs_diff_eq(Mat4::from_rotation_y(90f32.to_radians()), EPSILON));

    let moved = mouse_transform(0.0, 90.0, Vec3::new(0.0, 0.0, 2.0));
    let p = moved * Vec4::new(1.0, 0.0, 0.0, 1.0);
    assert!(p.abs_diff_eq(Vec4::new(0.0, 0.0, 1.0, 1.0), EPSILON));
}
