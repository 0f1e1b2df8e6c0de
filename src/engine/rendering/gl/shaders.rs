//! ### English
//! GLSL sources for the full-surface quad.
//!
//! The quad is generated from `gl_VertexID` (4-vertex triangle strip, no vertex buffers). Frame
//! rows arrive top-down, so the V coordinate is flipped.
//!
//! ### 中文
//! 全 surface 四边形的 GLSL 源码。
//!
//! 四边形由 `gl_VertexID` 生成（4 顶点三角形带，无顶点缓冲）。帧数据行序自上而下，因此翻转 V 坐标。

const VERTEX_BODY: &str = r#"
out vec2 v_uv;

void main() {
    vec2 corner = vec2(float(gl_VertexID & 1), float((gl_VertexID >> 1) & 1));
    v_uv = vec2(corner.x, 1.0 - corner.y);
    gl_Position = vec4(corner * 2.0 - 1.0, 0.0, 1.0);
}
"#;

const FRAGMENT_BODY: &str = r#"
in vec2 v_uv;
uniform sampler2D u_frame;
out vec4 o_color;

void main() {
    o_color = vec4(texture(u_frame, v_uv).rgb, 1.0);
}
"#;

fn header(is_gles: bool) -> &'static str {
    if is_gles {
        "#version 300 es\nprecision mediump float;\n"
    } else {
        "#version 330 core\n"
    }
}

pub(super) fn vertex_source(is_gles: bool) -> String {
    format!("{}{VERTEX_BODY}", header(is_gles))
}

pub(super) fn fragment_source(is_gles: bool) -> String {
    format!("{}{FRAGMENT_BODY}", header(is_gles))
}

/// ### English
/// Name of the sampler uniform bound to texture unit 0.
///
/// ### 中文
/// 绑定到纹理单元 0 的采样器 uniform 名称。
pub(super) const FRAME_UNIFORM: &str = "u_frame";
