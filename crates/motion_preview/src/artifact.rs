use serde::{Deserialize, Serialize};

use crate::compiler::PreviewSource;

/// Scene shown when nothing has been generated yet.
pub const PLACEHOLDER_SCENE: &str = r#"// Motion Canvas code will appear here...
import {makeScene2D} from '@motion-canvas/2d';
import {Circle} from '@motion-canvas/2d/lib/components';
import {createRef} from '@motion-canvas/core/lib/utils';

export default makeScene2D(function* (view) {
  const circle = createRef<Circle>();
  view.add(<Circle ref={circle} size={320} fill={'lightseagreen'} />);

  yield* circle().scale(2, 2).to(1, 2);
});"#;

/// Result of one generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    /// Motion Canvas scene script. Stored and shown, never run.
    pub motion_canvas_code: String,
    /// Body of the preview routine.
    pub preview_code: String,
    pub explanation: String,
}

impl GeneratedContent {
    pub fn preview_source(&self) -> PreviewSource {
        PreviewSource::new(self.preview_code.clone())
    }

    /// The scene script, or the placeholder if there is none.
    pub fn scene_or_placeholder(&self) -> &str {
        if self.motion_canvas_code.trim().is_empty() {
            PLACEHOLDER_SCENE
        } else {
            &self.motion_canvas_code
        }
    }
}
